use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

use super::credentials::{CredentialBackend, StoredEntry};

const SERVICE_NAME: &str = "minibank";

/// OS keychain storage. Each key is one keychain entry holding the
/// JSON-encoded `StoredEntry`.
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn read(&self, key: &str) -> Result<Option<StoredEntry>> {
        match self.entry(key)?.get_password() {
            Ok(raw) => {
                let entry = serde_json::from_str(&raw).context("Failed to parse keychain entry")?;
                Ok(Some(entry))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credential from keychain"),
        }
    }

    fn write(&self, key: &str, entry: &StoredEntry) -> Result<()> {
        let raw = serde_json::to_string(entry)?;
        self.entry(key)?
            .set_password(&raw)
            .context("Failed to store credential in keychain")
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialBackend for KeyringBackend {
    fn load(&self, key: &str) -> Option<StoredEntry> {
        self.read(key).unwrap_or_else(|e| {
            warn!(key = key, error = %e, "Keychain read failed");
            None
        })
    }

    fn store(&self, key: &str, entry: StoredEntry) {
        if let Err(e) = self.write(key, &entry) {
            warn!(key = key, error = %e, "Keychain write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.delete(key) {
            warn!(key = key, error = %e, "Keychain delete failed");
        }
    }
}
