//! Console state and command handlers.
//!
//! The console owns the session manager for the lifetime of one command and
//! listens for login redirects raised by the gateway or the watchdog. Every
//! section is gated through the route guard before any request goes out.

use std::io::{self, Write};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, Utc};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use stockroom_core::auth::{GuardDecision, WatchdogState};
use stockroom_core::models::{
    AccessType, BatchFilters, MovementFilters, ProductFilters, Section, SupplierFilters,
    UpdateProductRequest, UpdateSupplierRequest, UpdateUserRequest, UserFilters,
};
use stockroom_core::utils::{format_cents, format_date_br, parse_date_br};
use stockroom_core::{
    ApiClient, Config, ExpiryWatchdog, LogoutReason, Navigator, Redirect, RouteGuard,
    SessionManager, TokenStore,
};

use crate::forms::{self, LineArg};
use crate::render;
use crate::Resource;

const NOT_SIGNED_IN: &str = "Not signed in. Run `stockroom login` first.";

pub struct Console {
    config: Config,
    manager: SessionManager,
    guard: RouteGuard,
    redirects: broadcast::Receiver<Redirect>,
    watchdog: Option<ExpiryWatchdog>,
}

/// Fields given to `edit`; anything left out keeps its current value
#[derive(Debug, Default)]
pub struct Changes {
    pub name: Option<String>,
    pub email: Option<String>,
    pub access: Option<AccessType>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<i64>,
    pub telephone: Option<String>,
    pub address: Option<String>,
    pub cnpj: Option<String>,
}

impl Console {
    /// Wire the session core together and restore any stored session.
    pub fn start(config: Config) -> Result<Self> {
        let api_url = config.api_url()?;
        let tokens = config.token_store()?;
        Self::open(config, &api_url, tokens)
    }

    /// Must be called inside a tokio runtime; the expiry watchdog is
    /// mounted as soon as a session is restored.
    fn open(config: Config, api_url: &str, tokens: TokenStore) -> Result<Self> {
        let navigator = Navigator::new();
        let redirects = navigator.subscribe();
        let api = ApiClient::new(api_url, tokens, navigator)?;

        let manager = SessionManager::new(api);
        if let Err(e) = manager.initialize() {
            warn!(error = %e, "Stored session discarded");
            eprintln!("Your stored session could not be read ({}). Please sign in again.", e);
        }
        let guard = RouteGuard::new(manager.handle());

        let mut console = Self {
            config,
            manager,
            guard,
            redirects,
            watchdog: None,
        };
        console.arm_watchdog();
        Ok(console)
    }

    /// Replace the watchdog for the current session. An expiry already in
    /// the past ends the session here.
    fn arm_watchdog(&mut self) {
        self.watchdog = None;
        if self.manager.is_authenticated() {
            let api = self.manager.api();
            self.watchdog = Some(ExpiryWatchdog::mount(
                api.tokens().clone(),
                api.navigator().clone(),
            ));
        }
        self.drain_redirects();
    }

    fn api(&self) -> &ApiClient {
        self.manager.api()
    }

    fn require(&mut self, section: Section) -> Result<()> {
        self.drain_redirects();
        match self.guard.check(section) {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Loading => bail!("Session is still loading"),
            GuardDecision::RedirectToLogin => bail!(NOT_SIGNED_IN),
            GuardDecision::Forbidden => {
                let level = self
                    .manager
                    .user()
                    .map(|u| u.access_label())
                    .unwrap_or("Unknown");
                bail!("{} is not available to your access level ({})", section.title(), level)
            }
        }
    }

    /// React to redirects raised while the command ran.
    fn drain_redirects(&mut self) {
        loop {
            match self.redirects.try_recv() {
                Ok(redirect) => {
                    self.manager.end_session(redirect.reason);
                    if redirect.reason != LogoutReason::SignedOut {
                        eprintln!(
                            "{}. Run `stockroom login` to sign in again.",
                            redirect.reason.description()
                        );
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed redirect notifications");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    pub fn finish(&mut self) {
        self.drain_redirects();
    }

    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email {
            Some(email) => email.trim().to_string(),
            None => prompt_email(self.config.last_email.as_deref())?,
        };
        let password = rpassword::prompt_password("Password: ")?;
        if email.is_empty() || password.is_empty() {
            bail!("Email and password required");
        }

        println!("Signing in...");
        let user = self.manager.login(&email, &password).await?;
        self.arm_watchdog();

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Welcome, {} ({})", user.name, user.access_label());
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        if !self.manager.is_authenticated() {
            println!("Already signed out.");
            return Ok(());
        }
        self.watchdog = None;
        self.manager.logout()?;
        println!("Signed out.");
        Ok(())
    }

    pub fn whoami(&mut self) -> Result<()> {
        self.drain_redirects();
        let Some(user) = self.manager.user() else {
            bail!(NOT_SIGNED_IN);
        };
        println!("{} <{}>", user.name, user.email);
        println!("Access:   {}", user.access_label());

        let expiry = self.api().tokens().read_expiry()?;
        match expiry.as_deref().and_then(|raw| raw.parse::<i64>().ok()) {
            Some(exp) => match DateTime::<Utc>::from_timestamp(exp, 0) {
                Some(at) => {
                    let left = at - Utc::now();
                    println!(
                        "Expires:  {} ({} min left)",
                        at.with_timezone(&Local).format("%d/%m/%Y %H:%M"),
                        left.num_minutes().max(0)
                    );
                }
                None => println!("Expires:  unknown"),
            },
            None => println!("Expires:  unknown"),
        }

        let sections: Vec<&str> = self
            .guard
            .visible_sections()
            .iter()
            .map(|s| s.title())
            .collect();
        println!("Sections: {}", sections.join(", "));
        Ok(())
    }

    pub async fn dashboard(&mut self, limit: Option<u32>, threshold: Option<u32>) -> Result<()> {
        self.require(Section::Dashboard)?;
        let api = self.api();

        let (products, amount, expiring, low_stock, summary) = futures::try_join!(
            api.total_products(),
            api.total_amount(),
            api.expiring_batches(limit),
            api.low_stock(threshold),
            api.stock_summary()
        )?;

        println!("{}", render::section_heading("Dashboard"));
        println!("Products in catalog: {}", products.total_products);
        println!("Stock value:         {}", format_cents(amount.amount));
        println!();

        println!("Expiring batches ({})", expiring.total);
        let rows: Vec<Vec<String>> = expiring
            .flatten()
            .into_iter()
            .map(|row| {
                vec![
                    row.batch_id.to_string(),
                    row.product_name,
                    row.quantity.to_string(),
                    format_date_br(&row.validity),
                    row.supplier,
                ]
            })
            .collect();
        if rows.is_empty() {
            println!("None.");
        } else {
            print!(
                "{}",
                render::table(&["Batch", "Product", "Qty", "Validity", "Supplier"], &rows)
            );
        }
        println!();

        println!("Low stock ({})", low_stock.total);
        let rows: Vec<Vec<String>> = low_stock
            .products
            .iter()
            .map(|entry| {
                vec![
                    entry.product.id.to_string(),
                    entry.product.name.clone(),
                    entry.quantity.to_string(),
                ]
            })
            .collect();
        if rows.is_empty() {
            println!("None.");
        } else {
            print!("{}", render::table(&["ID", "Product", "Qty"], &rows));
        }
        println!();

        println!("Stock summary");
        let rows: Vec<Vec<String>> = summary
            .iter()
            .map(|s| {
                vec![
                    s.name.clone(),
                    s.total_quantity.to_string(),
                    format_cents(s.unit_price_cents),
                    format_cents(s.total_value_cents),
                ]
            })
            .collect();
        print!(
            "{}",
            render::table(&["Product", "Qty", "Unit price", "Total"], &rows)
        );
        Ok(())
    }

    pub async fn users(&mut self, page: u32, name: Option<String>, email: Option<String>) -> Result<()> {
        self.require(Section::Users)?;
        let filters = UserFilters {
            page: Some(page),
            name,
            email,
            ..Default::default()
        };
        let users = self.api().list_users(&filters).await?;
        print!(
            "{}",
            render::page(&["ID", "Name", "Email", "Access"], &users, |u| {
                vec![
                    u.id.to_string(),
                    u.name.clone(),
                    u.email.clone(),
                    u.access_label().to_string(),
                ]
            })
        );
        Ok(())
    }

    pub async fn products(
        &mut self,
        page: u32,
        name: Option<String>,
        category: Option<String>,
    ) -> Result<()> {
        self.require(Section::Products)?;
        let filters = ProductFilters {
            page: Some(page),
            name,
            category,
            ..Default::default()
        };
        let products = self.api().list_products(&filters).await?;
        print!(
            "{}",
            render::page(
                &["ID", "Name", "Category", "Unit price", "Description"],
                &products,
                |p| {
                    vec![
                        p.id.to_string(),
                        p.name.clone(),
                        p.category_name().to_string(),
                        format_cents(p.unit_price),
                        p.description.clone(),
                    ]
                }
            )
        );
        Ok(())
    }

    pub async fn suppliers(&mut self, page: u32, name: Option<String>, cnpj: Option<String>) -> Result<()> {
        self.require(Section::Suppliers)?;
        let filters = SupplierFilters {
            page: Some(page),
            name,
            cnpj,
            ..Default::default()
        };
        let suppliers = self.api().list_suppliers(&filters).await?;
        print!(
            "{}",
            render::page(&["ID", "Name", "CNPJ", "Phone", "Address"], &suppliers, |s| {
                vec![
                    s.id.to_string(),
                    s.name.clone(),
                    s.cnpj.clone(),
                    s.telephone.clone(),
                    s.address.clone(),
                ]
            })
        );
        Ok(())
    }

    pub async fn batches(&mut self, page: u32, validity: Option<String>) -> Result<()> {
        self.require(Section::Batches)?;
        let validity = match validity {
            Some(date) => match parse_date_br(&date) {
                Some(iso) => Some(iso),
                None => bail!("Invalid date '{}', expected dd/mm/yyyy", date),
            },
            None => None,
        };
        let filters = BatchFilters {
            page: Some(page),
            validity,
            ..Default::default()
        };
        let batches = self.api().list_batches(&filters).await?;
        print!(
            "{}",
            render::page(&["ID", "Supplier", "Qty", "Price", "Validity"], &batches, |b| {
                vec![
                    b.id.to_string(),
                    b.supplier.name.clone(),
                    b.quantity.to_string(),
                    format_cents(b.price),
                    format_date_br(&b.validity),
                ]
            })
        );
        Ok(())
    }

    pub async fn batch(&mut self, id: i64) -> Result<()> {
        self.require(Section::Batches)?;
        let batch = self.api().get_batch(id).await?;

        println!("{}", render::section_heading(&format!("Batch {}", batch.id)));
        println!("Supplier: {}", batch.supplier);
        println!("Validity: {}", format_date_br(&batch.validity));
        println!("Quantity: {}", batch.quantity);
        println!("Price:    {}", format_cents(batch.price));
        println!();

        let rows: Vec<Vec<String>> = batch
            .products
            .iter()
            .map(|item| vec![item.name.clone(), item.quantity.to_string()])
            .collect();
        print!("{}", render::table(&["Product", "Qty"], &rows));
        Ok(())
    }

    pub async fn movements(&mut self, page: u32) -> Result<()> {
        self.require(Section::Movements)?;
        let filters = MovementFilters {
            page: Some(page),
            ..Default::default()
        };
        let movements = self.api().list_movements(&filters).await?;
        print!(
            "{}",
            render::page(
                &["ID", "Date", "Type", "Qty", "Products", "User"],
                &movements,
                |m| {
                    vec![
                        m.id.to_string(),
                        format_date_br(&m.date),
                        m.kind.clone(),
                        m.quantity.to_string(),
                        m.product_names(),
                        m.user.clone(),
                    ]
                }
            )
        );
        Ok(())
    }

    pub async fn delete(&mut self, resource: Resource, id: i64, yes: bool) -> Result<()> {
        let (section, noun) = match resource {
            Resource::User => (Section::Users, "user"),
            Resource::Product => (Section::Products, "product"),
            Resource::Supplier => (Section::Suppliers, "supplier"),
            Resource::Movement => (Section::Movements, "movement"),
        };
        self.require(section)?;

        if !yes && !confirm(&format!("Delete {} {}? This cannot be undone.", noun, id))? {
            println!("Cancelled.");
            return Ok(());
        }

        let api = self.api();
        match resource {
            Resource::User => api.delete_user(id).await?,
            Resource::Product => api.delete_product(id).await?,
            Resource::Supplier => api.delete_supplier(id).await?,
            Resource::Movement => api.delete_movement(id).await?,
        };
        info!(resource = noun, id, "Record deleted");
        println!("Deleted {} {}.", noun, id);
        Ok(())
    }

    /// Stay attached until the session expires or the user interrupts.
    pub async fn watch(&mut self) -> Result<()> {
        self.drain_redirects();
        let Some(watchdog) = self.watchdog.as_ref() else {
            bail!(NOT_SIGNED_IN);
        };
        let mut states = watchdog.subscribe();

        loop {
            let state = *states.borrow_and_update();
            match state {
                WatchdogState::Idle => {
                    println!("Session has no expiry on record; nothing to watch.");
                    break;
                }
                WatchdogState::Armed => println!("Watching session. Press Ctrl-C to stop."),
                WatchdogState::Warning => {
                    println!("Your session ends in less than 5 minutes. Sign in again to keep working.")
                }
                WatchdogState::Expired => break,
            }

            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }

        self.drain_redirects();
        Ok(())
    }

    pub async fn categories(&mut self) -> Result<()> {
        self.require(Section::Products)?;
        let categories = self.api().list_categories().await?;
        if categories.is_empty() {
            println!("No records found.");
            return Ok(());
        }
        let rows: Vec<Vec<String>> = categories
            .iter()
            .map(|c| vec![c.id.to_string(), c.name.clone()])
            .collect();
        print!("{}", render::table(&["ID", "Name"], &rows));
        Ok(())
    }

    pub async fn add_user(&mut self, name: &str, email: &str, access: AccessType) -> Result<()> {
        self.require(Section::Users)?;
        let password = prompt_new_password()?;
        let request = forms::user_request(name, email, &password, access)?;
        self.api().create_user(&request).await?;
        info!(email = %request.email, "User created");
        println!("Created user {} ({}).", request.name, access.label());
        Ok(())
    }

    pub async fn add_product(
        &mut self,
        name: &str,
        description: &str,
        price: &str,
        category_id: i64,
    ) -> Result<()> {
        self.require(Section::Products)?;
        let unit_price = forms::price_cents(price)?;
        let categories = self.api().list_categories().await?;
        let request =
            forms::product_request(name, description, unit_price, category_id, &categories)?;
        self.api().create_product(&request).await?;
        info!(name = %request.name, "Product created");
        println!("Created product {} at {}.", request.name, format_cents(unit_price));
        Ok(())
    }

    pub async fn add_supplier(
        &mut self,
        name: &str,
        telephone: &str,
        address: &str,
        cnpj: &str,
    ) -> Result<()> {
        self.require(Section::Suppliers)?;
        let request = forms::supplier_request(name, telephone, address, cnpj)?;
        self.api().create_supplier(&request).await?;
        info!(cnpj = %request.cnpj, "Supplier created");
        println!("Created supplier {}.", request.name);
        Ok(())
    }

    pub async fn add_batch(&mut self, supplier_id: i64, validity: &str, items: &[LineArg]) -> Result<()> {
        self.require(Section::Batches)?;
        let catalog = self.api().products_by_supplier(supplier_id).await?;
        let request = forms::batch_request(supplier_id, validity, items, &catalog)?;
        self.api().create_batch(&request).await?;
        info!(supplier_id, quantity = request.quantity, "Batch created");
        println!(
            "Created batch of {} units for {}.",
            request.quantity,
            format_cents(request.price)
        );
        Ok(())
    }

    pub async fn add_movement(
        &mut self,
        kind: &str,
        product_id: i64,
        quantity: i64,
        date: Option<&str>,
    ) -> Result<()> {
        self.require(Section::Movements)?;
        let Some(user) = self.manager.user() else {
            bail!(NOT_SIGNED_IN);
        };
        let date = match date {
            Some(date) => forms::date_br(date)?,
            None => Utc::now(),
        };
        let request = forms::movement_request(kind, quantity, product_id, user.id, date)?;
        self.api().create_movement(&request).await?;
        info!(product_id, quantity, "Movement recorded");
        println!("Recorded {} of {} units of product {}.", request.kind, quantity, product_id);
        Ok(())
    }

    pub async fn edit(&mut self, resource: Resource, id: i64, changes: Changes) -> Result<()> {
        match resource {
            Resource::User => {
                self.require(Section::Users)?;
                let current = self.api().get_user(id).await?;
                // Updates replace the whole record, password included
                let password = prompt_new_password()?;
                let access = match changes.access {
                    Some(access) => access,
                    None => match current.access() {
                        Some(access) => access,
                        None => bail!("User {} has an unknown access level; pass --access", id),
                    },
                };
                let user = forms::user_request(
                    changes.name.as_deref().unwrap_or(&current.name),
                    changes.email.as_deref().unwrap_or(&current.email),
                    &password,
                    access,
                )?;
                self.api().update_user(&UpdateUserRequest { id, user }).await?;
            }
            Resource::Product => {
                self.require(Section::Products)?;
                let current = self.api().get_product(id).await?;
                let unit_price = match changes.price.as_deref() {
                    Some(price) => forms::price_cents(price)?,
                    None => current.unit_price,
                };
                let categories = self.api().list_categories().await?;
                let product = forms::product_request(
                    changes.name.as_deref().unwrap_or(&current.name),
                    changes.description.as_deref().unwrap_or(&current.description),
                    unit_price,
                    changes.category.unwrap_or(current.category_id),
                    &categories,
                )?;
                self.api()
                    .update_product(&UpdateProductRequest { id, product })
                    .await?;
            }
            Resource::Supplier => {
                self.require(Section::Suppliers)?;
                let current = self.api().get_supplier(id).await?;
                let supplier = forms::supplier_request(
                    changes.name.as_deref().unwrap_or(&current.name),
                    changes.telephone.as_deref().unwrap_or(&current.telephone),
                    changes.address.as_deref().unwrap_or(&current.address),
                    changes.cnpj.as_deref().unwrap_or(&current.cnpj),
                )?;
                self.api()
                    .update_supplier(&UpdateSupplierRequest { id, supplier })
                    .await?;
            }
            Resource::Movement => bail!("Movements cannot be edited; delete and record again"),
        }
        info!(id, "Record updated");
        println!("Updated {}.", id);
        Ok(())
    }
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    let again = rpassword::prompt_password("Repeat password: ")?;
    if password != again {
        bail!("Passwords do not match");
    }
    Ok(password)
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
