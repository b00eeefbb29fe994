use std::sync::Arc;

use tracing::{debug, info, warn};

use super::CredentialStore;
use crate::models::{LoginResponse, User};

/// Store key for the short-lived bearer token
pub const SESSION_TOKEN_KEY: &str = "authToken";

/// Store key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Store key for the JSON-serialized cached user
pub const USER_KEY: &str = "user";

/// Session token lifetime in days.
pub const SESSION_TOKEN_TTL_DAYS: i64 = 7;

/// Refresh token lifetime in days.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Cached user lifetime in days, matching the session token.
pub const USER_TTL_DAYS: i64 = 7;

/// Typed view over the credential record: session token, refresh token and
/// cached user. Cloning shares the underlying store.
#[derive(Clone)]
pub struct Session {
    store: Arc<CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(CredentialStore::in_memory()))
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    /// Current bearer token. Read on every call, never cached.
    pub fn session_token(&self) -> Option<String> {
        self.store.get(SESSION_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Whether a user identity is cached, i.e. the caller authenticated at
    /// some point, regardless of whether the tokens are still live.
    pub fn has_cached_user(&self) -> bool {
        self.store.get(USER_KEY).is_some()
    }

    pub fn cached_user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    /// Load the cached user, dropping an entry that no longer parses.
    pub fn restore_user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unparseable cached user");
                self.store.delete(USER_KEY);
                None
            }
        }
    }

    pub fn set_session_token(&self, token: &str) {
        self.store.set(SESSION_TOKEN_KEY, token, SESSION_TOKEN_TTL_DAYS);
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.store.set(REFRESH_TOKEN_KEY, token, REFRESH_TOKEN_TTL_DAYS);
    }

    pub fn set_cached_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw, USER_TTL_DAYS),
            Err(e) => warn!(error = %e, "Failed to serialize user for caching"),
        }
    }

    /// Persist everything a login response provides and return the user.
    pub fn store_login(&self, response: &LoginResponse, username: &str) -> User {
        if let Some(ref token) = response.token {
            self.set_session_token(token);
        }
        if let Some(ref refresh) = response.refresh_token {
            self.set_refresh_token(refresh);
        }
        let user = response.user_or_fallback(username);
        self.set_cached_user(&user);
        debug!(
            has_token = response.token.is_some(),
            has_refresh_token = response.refresh_token.is_some(),
            "Stored login credentials"
        );
        user
    }

    /// Remove all three credential entries in one backend change.
    pub fn clear(&self) {
        self.store.delete_all(&[SESSION_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY]);
        info!("Cleared stored credentials");
    }

    pub fn is_empty(&self) -> bool {
        self.session_token().is_none() && self.refresh_token().is_none() && !self.has_cached_user()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::auth::{CredentialBackend, MemoryBackend, StoredEntry};

    type Presence = (bool, bool, bool);

    /// Records which of (session token, refresh token, user) are present
    /// after every removal.
    struct RecordingBackend {
        inner: MemoryBackend,
        snapshots: Arc<Mutex<Vec<Presence>>>,
    }

    impl RecordingBackend {
        fn snapshot(&self) {
            let present = |key: &str| self.inner.load(key).is_some();
            let state = (present(SESSION_TOKEN_KEY), present(REFRESH_TOKEN_KEY), present(USER_KEY));
            self.snapshots.lock().expect("lock snapshots").push(state);
        }
    }

    impl CredentialBackend for RecordingBackend {
        fn load(&self, key: &str) -> Option<StoredEntry> {
            self.inner.load(key)
        }

        fn store(&self, key: &str, entry: StoredEntry) {
            self.inner.store(key, entry);
        }

        fn remove(&self, key: &str) {
            self.inner.remove(key);
            self.snapshot();
        }

        fn remove_all(&self, keys: &[&str]) {
            self.inner.remove_all(keys);
            self.snapshot();
        }
    }

    fn login_response() -> LoginResponse {
        serde_json::from_str(
            r#"{"token":"t-1","refreshToken":"r-1","user":{"id":"u-1","username":"john_doe"}}"#,
        )
        .expect("parse login response")
    }

    #[test]
    fn test_store_login_and_clear() {
        let session = Session::in_memory();
        assert!(session.is_empty());

        let user = session.store_login(&login_response(), "john_doe");
        assert_eq!(user.id.as_deref(), Some("u-1"));
        assert_eq!(session.session_token().as_deref(), Some("t-1"));
        assert_eq!(session.refresh_token().as_deref(), Some("r-1"));
        assert!(session.has_cached_user());
        assert_eq!(session.cached_user(), Some(user));

        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_clear_never_exposes_partial_state() {
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            inner: MemoryBackend::default(),
            snapshots: Arc::clone(&snapshots),
        };
        let session = Session::new(Arc::new(CredentialStore::new(backend)));

        session.store_login(&login_response(), "john_doe");
        session.clear();

        let seen = snapshots.lock().expect("lock snapshots").clone();
        assert_eq!(seen, vec![(false, false, false)]);
        assert!(session.is_empty());
    }

    #[test]
    fn test_clones_share_store() {
        let session = Session::in_memory();
        let other = session.clone();
        session.set_session_token("t-2");
        assert_eq!(other.session_token().as_deref(), Some("t-2"));
    }

    #[test]
    fn test_restore_user_drops_corrupt_entry() {
        let session = Session::in_memory();
        session.store().set(USER_KEY, "{not json", USER_TTL_DAYS);

        // Presence alone still marks a previous login
        assert!(session.has_cached_user());
        assert!(session.cached_user().is_none());

        assert!(session.restore_user().is_none());
        assert!(!session.has_cached_user());
    }
}
