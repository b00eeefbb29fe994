//! Core library for the MiniBanking client.
//!
//! - [`auth`]: credential store backends and typed session accessors
//! - [`api`]: request dispatcher, session refresh coordinator and the
//!   typed banking API client
//! - [`navigation`]: login redirect bridge used by non-UI code
//! - [`models`]: request/response types for the banking REST API
//! - [`config`]: persisted client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod utils;

pub use api::{ApiError, BankingClient, Dispatcher, ErrorPayload, RequestDescriptor, SessionRefreshCoordinator};
pub use auth::{CredentialStore, Session};
pub use config::Config;
pub use navigation::{NavigationBridge, NavigationTarget, Navigator};
