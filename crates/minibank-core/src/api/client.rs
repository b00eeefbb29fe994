//! Typed client for the MiniBanking REST API.
//!
//! Every call goes through the `SessionRefreshCoordinator`, so an expired
//! session is refreshed transparently and a dead one ends in a login
//! redirect.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ApiError, Dispatcher, RequestDescriptor, SessionRefreshCoordinator};
use crate::auth::Session;
use crate::config::Config;
use crate::models::{
    Account, AccountBalance, AccountCreateRequest, AccountSearch, AccountUpdateRequest, LoginRequest,
    LoginResponse, RegisterRequest, Transaction, TransactionFilter, TransactionPage, TransferRequest,
    TransferResponse, User,
};
use crate::navigation::Navigator;

/// Default page size for paginated transaction history
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Clone is cheap - the coordinator and dispatcher are shared.
#[derive(Clone)]
pub struct BankingClient {
    coordinator: SessionRefreshCoordinator,
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", path, e)))
}

impl BankingClient {
    pub fn new(coordinator: SessionRefreshCoordinator) -> Self {
        Self { coordinator }
    }

    /// Wire dispatcher and coordinator from configuration.
    pub fn from_config(config: &Config, session: Session, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        Self::connect(config.base_url(), session, navigator, config.request_timeout())
    }

    pub fn connect(
        base_url: impl Into<String>,
        session: Session,
        navigator: Arc<dyn Navigator>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let dispatcher = Dispatcher::new(base_url, session, timeout)?;
        Ok(Self::new(SessionRefreshCoordinator::new(Arc::new(dispatcher), navigator)))
    }

    pub fn coordinator(&self) -> &SessionRefreshCoordinator {
        &self.coordinator
    }

    pub fn session(&self) -> &Session {
        self.coordinator.session()
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T, ApiError> {
        let path = request.path.clone();
        let value = self.coordinator.execute(request).await?;
        decode(&path, value)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(RequestDescriptor::get(path)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.call(RequestDescriptor::post(path).with_json(body)?).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.call(RequestDescriptor::put(path).with_json(body)?).await
    }

    // ===== Authentication =====

    /// Log in and persist the returned tokens and user.
    ///
    /// Login is refresh-exempt: bad credentials must surface as a plain 401,
    /// never start a refresh cycle.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let request = RequestDescriptor::post("/api/users/login")
            .with_json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })?
            .refresh_exempt();

        let response: LoginResponse = self.call(request).await?;
        let user = self.session().store_login(&response, username);
        info!(username = username, "Login successful");
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/api/users/register")
            .with_json(request)?
            .refresh_exempt();
        self.call(request).await
    }

    /// Tell the server to end the session, then clear local credentials
    /// whatever the server said.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .call::<Value>(RequestDescriptor::post("/api/users/logout").with_payload(json!({})))
            .await;
        if let Err(ref e) = result {
            warn!(error = %e, "Logout request failed, clearing local session anyway");
        }
        self.session().clear();
        result.map(|_| ())
    }

    /// The cached user from a previous login, if any.
    pub fn current_user(&self) -> Option<User> {
        self.session().restore_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().has_cached_user()
    }

    // ===== Accounts =====

    pub async fn search_accounts(&self, filter: &AccountSearch) -> Result<Vec<Account>, ApiError> {
        let accounts: Option<Vec<Account>> = self.post("/api/accounts/search", filter).await?;
        Ok(accounts.unwrap_or_default())
    }

    pub async fn create_account(&self, request: &AccountCreateRequest) -> Result<Account, ApiError> {
        self.post("/api/accounts", request).await
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, ApiError> {
        self.get(&format!("/api/accounts/{}", account_id)).await
    }

    pub async fn update_account(&self, account_id: &str, name: &str) -> Result<Account, ApiError> {
        let body = AccountUpdateRequest {
            name: name.to_string(),
        };
        self.put(&format!("/api/accounts/{}", account_id), &body).await
    }

    pub async fn delete_account(&self, account_id: &str) -> Result<(), ApiError> {
        self.coordinator
            .execute(RequestDescriptor::delete(format!("/api/accounts/{}", account_id)))
            .await
            .map(|_| ())
    }

    // ===== Transfers =====

    pub async fn transfer(&self, request: &TransferRequest) -> Result<TransferResponse, ApiError> {
        self.post("/api/transfers", request).await
    }

    pub async fn account_balance(&self, account_id: &str) -> Result<AccountBalance, ApiError> {
        self.get(&format!("/api/transfers/accounts/{}/balance", account_id)).await
    }

    pub async fn transaction_history(
        &self,
        account_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, ApiError> {
        let request = RequestDescriptor::get(format!("/api/transfers/transactions/account/{}", account_id))
            .with_query(filter.query_pairs());
        let transactions: Option<Vec<Transaction>> = self.call(request).await?;
        Ok(transactions.unwrap_or_default())
    }

    pub async fn transaction_history_paginated(
        &self,
        account_id: &str,
        page: u32,
        size: u32,
    ) -> Result<TransactionPage, ApiError> {
        let request = RequestDescriptor::get(format!(
            "/api/transfers/transactions/account/{}/paginated",
            account_id
        ))
        .with_query([("page", page.to_string()), ("size", size.to_string())]);
        self.call(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reports_path() {
        let err = decode::<Account>("/api/accounts/1", json!({"unexpected": true}))
            .expect_err("missing id must fail");
        match err {
            ApiError::InvalidResponse(msg) => assert!(msg.contains("/api/accounts/1")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_decode_null_as_empty_list() {
        let accounts: Option<Vec<Account>> = decode("/api/accounts/search", Value::Null).expect("decode null");
        assert!(accounts.is_none());
    }
}
