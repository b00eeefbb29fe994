//! Application configuration management.
//!
//! Holds the backend base URL, request timeout, credential storage choice
//! and last used username.
//!
//! Configuration is stored at `~/.config/minibank/config.json`. The
//! `MINIBANK_BACKEND_BASE_URL` environment variable (also read from `.env`)
//! overrides the stored base URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::dispatcher::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::{CredentialStore, FileBackend, KeyringBackend};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "minibank";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when neither config nor environment name one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the backend base URL
pub const BASE_URL_ENV: &str = "MINIBANK_BACKEND_BASE_URL";

/// Where credentials are persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStorage {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub credential_storage: CredentialStorage,
    #[serde(default)]
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Effective base URL: environment, then config file, then default.
    pub fn base_url(&self) -> String {
        self.resolve_base_url(std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve_base_url(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Open the configured credential store.
    pub fn credential_store(&self) -> Result<CredentialStore> {
        Ok(match self.credential_storage {
            CredentialStorage::File => CredentialStore::new(FileBackend::open(&self.cache_dir()?)),
            CredentialStorage::Keyring => CredentialStore::new(KeyringBackend::new()),
            CredentialStorage::Memory => CredentialStore::in_memory(),
        })
    }
}
