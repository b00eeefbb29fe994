//! Authentication module for managing persisted credentials.
//!
//! This module provides:
//! - `CredentialStore`: key/value store with advisory expiry, backed by
//!   memory, a JSON file, or the OS keychain
//! - `Session`: typed accessors for the session token, refresh token and
//!   cached user
//!
//! Session tokens and the cached user are kept for 7 days, refresh tokens
//! for 30 days.

pub mod credentials;
pub mod keychain;
pub mod session;

pub use credentials::{CredentialBackend, CredentialStore, FileBackend, MemoryBackend, StoredEntry};
pub use keychain::KeyringBackend;
pub use session::Session;
