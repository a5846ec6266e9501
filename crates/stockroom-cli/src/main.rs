//! Stockroom - a command-line console for the stockroom inventory API.
//!
//! Sign in once, then list users, products, suppliers, batches and stock
//! movements, or look at the dashboard aggregates. The session is kept
//! between runs and ends on logout, on expiry, or when the API rejects it.

mod console;
mod forms;
mod render;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockroom_core::config::{Config, StorageBackend};
use stockroom_core::models::AccessType;

use console::{Changes, Console};
use forms::LineArg;

#[derive(Parser)]
#[command(name = "stockroom", version, about = "Inventory administration console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        /// Defaults to the last email used
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user and the sections they can open
    Whoami,
    /// Stock totals, expiring batches and low-stock products
    Dashboard {
        /// Expiring-batch lookahead in days
        #[arg(long)]
        limit: Option<u32>,
        /// Low-stock cutoff in units
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// List users (administrators only)
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List products
    Products {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// List suppliers
    Suppliers {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cnpj: Option<String>,
    },
    /// List batches, or show one batch in detail
    Batches {
        /// Show this batch instead of the listing
        id: Option<i64>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only batches valid until this date (dd/mm/yyyy)
        #[arg(long)]
        validity: Option<String>,
    },
    /// List stock movements
    Movements {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List product categories
    Categories,
    /// Create a record
    Add {
        #[command(subcommand)]
        record: NewRecord,
    },
    /// Change fields of an existing record
    Edit {
        #[arg(value_enum)]
        resource: Resource,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Users only
        #[arg(long)]
        email: Option<String>,
        /// Users only
        #[arg(long, value_enum)]
        access: Option<AccessArg>,
        /// Products only
        #[arg(long)]
        description: Option<String>,
        /// Products only, e.g. "12,50"
        #[arg(long)]
        price: Option<String>,
        /// Products only
        #[arg(long)]
        category: Option<i64>,
        /// Suppliers only
        #[arg(long)]
        telephone: Option<String>,
        /// Suppliers only
        #[arg(long)]
        address: Option<String>,
        /// Suppliers only
        #[arg(long)]
        cnpj: Option<String>,
    },
    /// Delete a record after confirmation
    Delete {
        #[arg(value_enum)]
        resource: Resource,
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Stay attached and warn before the session expires
    Watch,
    /// Show or change the configuration
    Config {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long, value_enum)]
        storage: Option<StorageArg>,
    },
}

#[derive(Subcommand)]
enum NewRecord {
    /// Create a user; the password is prompted for
    User {
        name: String,
        email: String,
        #[arg(long, value_enum, default_value_t = AccessArg::Employee)]
        access: AccessArg,
    },
    /// Create a product
    Product {
        name: String,
        /// Unit price, e.g. "12,50" or "R$ 1.234,56"
        #[arg(long)]
        price: String,
        /// Category id, see `stockroom categories`
        #[arg(long)]
        category: i64,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Create a supplier
    Supplier {
        name: String,
        #[arg(long)]
        telephone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        cnpj: String,
    },
    /// Receive a batch from a supplier, priced from its catalog
    Batch {
        supplier: i64,
        /// Validity date (dd/mm/yyyy)
        #[arg(long)]
        validity: String,
        /// Products as product_id:quantity
        #[arg(required = true, value_parser = forms::parse_line)]
        items: Vec<LineArg>,
    },
    /// Record stock entering or leaving
    Movement {
        /// Movement type, e.g. entrada or saida
        kind: String,
        #[arg(long)]
        product: i64,
        #[arg(long)]
        quantity: i64,
        /// Defaults to now (dd/mm/yyyy)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AccessArg {
    Admin,
    Manager,
    Employee,
}

impl From<AccessArg> for AccessType {
    fn from(arg: AccessArg) -> Self {
        match arg {
            AccessArg::Admin => AccessType::Admin,
            AccessArg::Manager => AccessType::Manager,
            AccessArg::Employee => AccessType::Employee,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Resource {
    User,
    Product,
    Supplier,
    Movement,
}

#[derive(Clone, Copy, ValueEnum)]
enum StorageArg {
    File,
    Keyring,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::File => StorageBackend::File,
            StorageArg::Keyring => StorageBackend::Keyring,
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Console output honors `RUST_LOG` (default `warn`); a daily log file in
/// the data directory records `info` and above.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(filter);

    match config.data_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), "stockroom.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("info"));
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry().with(stderr_layer).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;
    let log_guard = init_tracing(&config);
    info!("Stockroom console starting");

    let command = match cli.command {
        Command::Config { api_url, storage } => {
            return configure(config, api_url, storage.map(Into::into));
        }
        command => command,
    };

    let mut console = Console::start(config)?;
    let result = match command {
        Command::Login { email } => console.login(email).await,
        Command::Logout => console.logout(),
        Command::Whoami => console.whoami(),
        Command::Dashboard { limit, threshold } => console.dashboard(limit, threshold).await,
        Command::Users { page, name, email } => console.users(page, name, email).await,
        Command::Products {
            page,
            name,
            category,
        } => console.products(page, name, category).await,
        Command::Suppliers { page, name, cnpj } => console.suppliers(page, name, cnpj).await,
        Command::Batches { id: Some(id), .. } => console.batch(id).await,
        Command::Batches {
            id: None,
            page,
            validity,
        } => console.batches(page, validity).await,
        Command::Movements { page } => console.movements(page).await,
        Command::Categories => console.categories().await,
        Command::Add { record } => add(&mut console, record).await,
        Command::Edit {
            resource,
            id,
            name,
            email,
            access,
            description,
            price,
            category,
            telephone,
            address,
            cnpj,
        } => {
            let changes = Changes {
                name,
                email,
                access: access.map(Into::into),
                description,
                price,
                category,
                telephone,
                address,
                cnpj,
            };
            console.edit(resource, id, changes).await
        }
        Command::Delete { resource, id, yes } => console.delete(resource, id, yes).await,
        Command::Watch => console.watch().await,
        Command::Config { .. } => Ok(()),
    };
    console.finish();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}

async fn add(console: &mut Console, record: NewRecord) -> Result<()> {
    match record {
        NewRecord::User {
            name,
            email,
            access,
        } => console.add_user(&name, &email, access.into()).await,
        NewRecord::Product {
            name,
            price,
            category,
            description,
        } => console.add_product(&name, &description, &price, category).await,
        NewRecord::Supplier {
            name,
            telephone,
            address,
            cnpj,
        } => console.add_supplier(&name, &telephone, &address, &cnpj).await,
        NewRecord::Batch {
            supplier,
            validity,
            items,
        } => console.add_batch(supplier, &validity, &items).await,
        NewRecord::Movement {
            kind,
            product,
            quantity,
            date,
        } => {
            console
                .add_movement(&kind, product, quantity, date.as_deref())
                .await
        }
    }
}

fn configure(
    mut config: Config,
    api_url: Option<String>,
    storage: Option<StorageBackend>,
) -> Result<()> {
    let changed = api_url.is_some() || storage.is_some();
    if let Some(url) = api_url {
        config.api_url = Some(url);
    }
    if let Some(storage) = storage {
        config.storage = storage;
    }
    if changed {
        config.save()?;
    }

    println!("api_url:    {}", config.api_url.as_deref().unwrap_or("(not set)"));
    println!("storage:    {:?}", config.storage);
    println!("last_email: {}", config.last_email.as_deref().unwrap_or("-"));
    Ok(())
}
