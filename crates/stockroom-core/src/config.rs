//! Application configuration management.
//!
//! This module handles loading and saving the console configuration: the
//! API base URL, where session records are kept, and the last email used
//! to sign in.
//!
//! Configuration is stored at `~/.config/stockroom/config.json`. The
//! `STOCKROOM_API_URL` environment variable overrides the stored base URL.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileStore, KeyValueStore, KeyringStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "stockroom";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the configured base URL
pub const API_URL_ENV: &str = "STOCKROOM_API_URL";

/// Where session records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    #[serde(default)]
    pub storage: StorageBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// The API base URL. Without one the session core cannot start.
    pub fn api_url(&self) -> Result<String> {
        Self::resolve_api_url(std::env::var(API_URL_ENV).ok(), self.api_url.as_deref())
    }

    fn resolve_api_url(from_env: Option<String>, from_file: Option<&str>) -> Result<String> {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| {
                from_file
                    .filter(|url| !url.trim().is_empty())
                    .map(str::to_string)
            })
            .map(|url| url.trim().to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "API base URL is not configured; set {} or `api_url` in the config file",
                    API_URL_ENV
                )
            })
    }

    /// Token store over the configured backend
    pub fn token_store(&self) -> Result<TokenStore> {
        let backend: Arc<dyn KeyValueStore> = match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(self.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStore::new()),
        };
        Ok(TokenStore::new(backend))
    }
}
