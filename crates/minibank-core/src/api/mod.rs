//! REST API client module for the MiniBanking backend.
//!
//! Requests flow through three layers:
//!
//! - `Dispatcher`: sends a single request, attaching the bearer token read
//!   from the credential store at send time
//! - `SessionRefreshCoordinator`: intercepts 401 responses, shares one
//!   in-flight refresh exchange between all failing callers and replays the
//!   original request once
//! - `BankingClient`: typed wrappers for the banking endpoints

pub mod client;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod request;

pub use client::BankingClient;
pub use coordinator::SessionRefreshCoordinator;
pub use dispatcher::Dispatcher;
pub use error::{ApiError, ErrorPayload};
pub use request::RequestDescriptor;
