use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::lock;

/// Credential file name in cache directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Owner read/write only
#[cfg(unix)]
const CREDENTIALS_FILE_MODE: u32 = 0o600;

/// A stored value and the moment it stops being returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredEntry {
    pub fn new(value: impl Into<String>, ttl_days: i64) -> Self {
        Self {
            value: value.into(),
            expires_at: Utc::now() + Duration::days(ttl_days),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Persistence for small key/value pairs.
///
/// Backends never fail outward: read errors are absence, write errors are
/// logged by the implementation.
pub trait CredentialBackend: Send + Sync {
    fn load(&self, key: &str) -> Option<StoredEntry>;
    fn store(&self, key: &str, entry: StoredEntry);
    fn remove(&self, key: &str);

    /// Remove several keys as one change. Backends that can should apply it
    /// under a single lock so no reader sees a partial removal.
    fn remove_all(&self, keys: &[&str]) {
        for key in keys {
            self.remove(key);
        }
    }
}

/// Process-wide credential slot.
///
/// Values carry a TTL like browser cookies; an expired value reads as
/// absent and is dropped from the backend.
pub struct CredentialStore {
    backend: Box<dyn CredentialBackend>,
}

impl CredentialStore {
    pub fn new(backend: impl CredentialBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.backend.load(key)?;
        if entry.is_expired() {
            debug!(key = key, "Credential entry expired");
            self.backend.remove(key);
            return None;
        }
        Some(entry.value)
    }

    pub fn set(&self, key: &str, value: &str, ttl_days: i64) {
        self.backend.store(key, StoredEntry::new(value, ttl_days));
    }

    pub fn delete(&self, key: &str) {
        self.backend.remove(key);
    }

    pub fn delete_all(&self, keys: &[&str]) {
        self.backend.remove_all(keys);
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl CredentialBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<StoredEntry> {
        lock(&self.entries).get(key).cloned()
    }

    fn store(&self, key: &str, entry: StoredEntry) {
        lock(&self.entries).insert(key.to_string(), entry);
    }

    fn remove(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    fn remove_all(&self, keys: &[&str]) {
        let mut entries = lock(&self.entries);
        for key in keys {
            entries.remove(*key);
        }
    }
}

/// All entries in one JSON file, rewritten on every change.
pub struct FileBackend {
    path: PathBuf,
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl FileBackend {
    /// Open the credential file in `cache_dir`, starting empty if it is
    /// missing or unreadable.
    pub fn open(cache_dir: &Path) -> Self {
        let path = cache_dir.join(CREDENTIALS_FILE);
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable credential file");
                HashMap::new()
            }
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<HashMap<String, StoredEntry>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read credential file")?;
        serde_json::from_str(&contents).context("Failed to parse credential file")
    }

    fn write(&self, entries: &HashMap<String, StoredEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(CREDENTIALS_FILE_MODE);
        }
        let mut file = options.open(&self.path).context("Failed to open credential file")?;

        // The creation mode does not apply to a file that already exists
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(CREDENTIALS_FILE_MODE))
                .context("Failed to restrict credential file permissions")?;
        }

        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn persist(&self, entries: &HashMap<String, StoredEntry>) {
        if let Err(e) = self.write(entries) {
            warn!(path = %self.path.display(), error = %e, "Failed to save credential file");
        }
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self, key: &str) -> Option<StoredEntry> {
        lock(&self.entries).get(key).cloned()
    }

    fn store(&self, key: &str, entry: StoredEntry) {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), entry);
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }

    fn remove_all(&self, keys: &[&str]) {
        let mut entries = lock(&self.entries);
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.persist(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_set_delete() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.get("authToken"), None);

        store.set("authToken", "t-1", 7);
        assert_eq!(store.get("authToken").as_deref(), Some("t-1"));

        store.set("authToken", "t-2", 7);
        assert_eq!(store.get("authToken").as_deref(), Some("t-2"));

        store.delete("authToken");
        assert_eq!(store.get("authToken"), None);

        // Deleting a missing key is a no-op
        store.delete("authToken");
    }

    #[test]
    fn test_expired_entry_reads_as_absent() {
        let backend = MemoryBackend::default();
        backend.store(
            "refreshToken",
            StoredEntry {
                value: "r-1".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
            },
        );
        let store = CredentialStore::new(backend);

        assert_eq!(store.get("refreshToken"), None);
        assert!(store.backend.load("refreshToken").is_none());
    }

    #[test]
    fn test_stored_entry_expiry() {
        assert!(!StoredEntry::new("v", 7).is_expired());
        assert!(StoredEntry::new("v", -1).is_expired());
    }

    #[test]
    fn test_file_backend_persists_between_opens() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let store = CredentialStore::new(FileBackend::open(dir.path()));
        store.set("authToken", "t-1", 7);
        store.set("user", r#"{"username":"john_doe"}"#, 7);
        store.delete("user");

        let reopened = CredentialStore::new(FileBackend::open(dir.path()));
        assert_eq!(reopened.get("authToken").as_deref(), Some("t-1"));
        assert_eq!(reopened.get("user"), None);
    }

    #[test]
    fn test_file_backend_remove_all_in_one_write() {
        let dir = tempfile::tempdir().expect("create temp dir");

        let store = CredentialStore::new(FileBackend::open(dir.path()));
        store.set("authToken", "t-1", 7);
        store.set("refreshToken", "r-1", 30);
        store.set("theme", "dark", 30);
        store.delete_all(&["authToken", "refreshToken", "user"]);

        let reopened = CredentialStore::new(FileBackend::open(dir.path()));
        assert_eq!(reopened.get("authToken"), None);
        assert_eq!(reopened.get("refreshToken"), None);
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_backend_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let mode_of = |path: &Path| {
            std::fs::metadata(path)
                .expect("stat credential file")
                .permissions()
                .mode()
        };

        let dir = tempfile::tempdir().expect("create temp dir");
        let backend = FileBackend::open(dir.path());
        backend.store("refreshToken", StoredEntry::new("r-1", 30));
        assert_eq!(mode_of(backend.path()) & 0o077, 0);

        // A world-readable file from an earlier run is tightened on the next write
        let older = tempfile::tempdir().expect("create temp dir");
        let path = older.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "{}").expect("write credential file");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).expect("loosen permissions");

        let backend = FileBackend::open(older.path());
        backend.store("authToken", StoredEntry::new("t-1", 7));
        assert_eq!(mode_of(&path) & 0o077, 0);
    }

    #[test]
    fn test_file_backend_ignores_corrupt_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::write(dir.path().join(CREDENTIALS_FILE), "not json").expect("write corrupt file");

        let backend = FileBackend::open(dir.path());
        assert!(backend.load("authToken").is_none());

        backend.store("authToken", StoredEntry::new("t-1", 7));
        let contents = std::fs::read_to_string(backend.path()).expect("read credential file");
        assert!(contents.contains("t-1"));
    }
}
