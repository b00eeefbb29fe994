use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ApiError, RequestDescriptor};
use crate::auth::Session;

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Sends single requests against the backend.
///
/// The bearer token is read from the session on every send, so a request
/// issued after a refresh settles always carries the new token.
pub struct Dispatcher {
    client: Client,
    base_url: String,
    session: Session,
    max_rate_limit_retries: u32,
    initial_backoff: Duration,
}

impl Dispatcher {
    pub fn new(base_url: impl Into<String>, session: Session, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            max_rate_limit_retries: MAX_RATE_LIMIT_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the 429 retry policy.
    pub fn with_rate_limit_policy(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_rate_limit_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request, folding every failure into `ApiError`.
    ///
    /// Rate-limited requests back off and retry unless refresh-exempt.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match self.send_once(request).await {
                Err(e) if e.is_rate_limited() && !request.is_refresh_exempt() => {
                    retries += 1;
                    if retries > self.max_rate_limit_retries {
                        return Err(e);
                    }
                    warn!(
                        path = %request.path,
                        retry = retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                other => return other,
            }
        }
    }

    async fn send_once(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path));

        if !request.is_refresh_exempt() {
            if let Some(token) = self.session.session_token() {
                builder = builder.bearer_auth(token);
            }
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref payload) = request.payload {
            builder = builder.json(payload);
        }

        debug!(method = %request.method, path = %request.path, retried = request.is_retried(), "Sending request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(method = %request.method, path = %request.path, status = status.as_u16(), "Request failed");
            return Err(ApiError::from_status(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", request.path, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(base_url: &str) -> Dispatcher {
        Dispatcher::new(base_url, Session::in_memory(), Duration::from_secs(5)).expect("build dispatcher")
    }

    #[test]
    fn test_url_joining() {
        let d = dispatcher("http://localhost:8080/");
        assert_eq!(d.base_url(), "http://localhost:8080");
        assert_eq!(d.url("/api/accounts"), "http://localhost:8080/api/accounts");
        assert_eq!(d.url("api/accounts"), "http://localhost:8080/api/accounts");
    }

    #[tokio::test]
    async fn test_transport_error_is_folded() {
        // Port 9 (discard) is essentially never listening
        let d = dispatcher("http://127.0.0.1:9");
        let result = d.send(&RequestDescriptor::get("/api/accounts/1")).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
