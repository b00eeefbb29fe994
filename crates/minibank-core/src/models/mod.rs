//! Data models for the MiniBanking REST API.
//!
//! - `User`, `LoginResponse`, `RefreshResponse`: authentication payloads
//! - `Account`, `AccountSearch`, `AccountCreateRequest`: account management
//! - `TransferRequest`, `Transaction`, `TransactionPage`: transfers and
//!   transaction history

pub mod account;
pub mod transfer;
pub mod user;

pub use account::{Account, AccountBalance, AccountCreateRequest, AccountSearch, AccountType, AccountUpdateRequest};
pub use transfer::{Transaction, TransactionFilter, TransactionPage, TransferRequest, TransferResponse};
pub use user::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, User};
