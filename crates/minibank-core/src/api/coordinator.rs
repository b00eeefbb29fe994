//! Session refresh coordination.
//!
//! A 401 on an authenticated request from a caller with a cached identity
//! means the session token expired. The coordinator exchanges the refresh
//! token for a new session token and replays the request once. At most one
//! refresh exchange is in flight at a time: callers failing while one is
//! outstanding await the same shared handle and observe the same outcome.
//!
//! Credential updates, the credential wipe and the login redirect on failure
//! all happen inside the shared refresh future, so they run once per refresh
//! cycle no matter how many callers are waiting on it.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{ApiError, Dispatcher, RequestDescriptor};
use crate::auth::Session;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::navigation::Navigator;
use crate::utils::lock;

/// Refresh exchange endpoint
pub const REFRESH_PATH: &str = "/api/users/refresh";

/// Message shown on the login view after a failed refresh
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

type RefreshFuture = Shared<BoxFuture<'static, Result<String, ApiError>>>;

/// The pending refresh handle, tagged with a generation so a settled
/// exchange only clears its own slot.
#[derive(Default)]
struct RefreshSlot {
    generation: u64,
    pending: Option<(u64, RefreshFuture)>,
}

/// Constructed once at startup and shared by every API caller.
/// Clone is cheap and clones share the refresh slot.
#[derive(Clone)]
pub struct SessionRefreshCoordinator {
    dispatcher: Arc<Dispatcher>,
    navigator: Arc<dyn Navigator>,
    slot: Arc<Mutex<RefreshSlot>>,
}

impl SessionRefreshCoordinator {
    pub fn new(dispatcher: Arc<Dispatcher>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            dispatcher,
            navigator,
            slot: Arc::new(Mutex::new(RefreshSlot::default())),
        }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn session(&self) -> &Session {
        self.dispatcher.session()
    }

    pub fn is_refresh_in_flight(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    /// Send a request, recovering from an expired session when possible.
    ///
    /// Successful responses, refresh-exempt requests, already-retried
    /// requests and every error other than 401 pass through untouched.
    pub async fn execute(&self, mut request: RequestDescriptor) -> Result<Value, ApiError> {
        let sent_with = self.session().session_token();
        let error = match self.dispatcher.send(&request).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if request.is_refresh_exempt() || request.is_retried() || !error.is_unauthorized() {
            return Err(error);
        }

        request.mark_retried();

        if !self.session().has_cached_user() {
            info!(path = %request.path, "Unauthenticated request, redirecting to login");
            self.navigator.navigate_to_login(None);
            return Err(error);
        }

        // A refresh settled while this request was out; its token is already stored
        let current = self.session().session_token();
        if current.is_some() && current != sent_with {
            debug!(path = %request.path, "Session token changed in flight, replaying without refresh");
            return self.dispatcher.send(&request).await;
        }

        debug!(path = %request.path, "Session token rejected, refreshing");
        self.refresh().await?;

        debug!(path = %request.path, "Replaying request with refreshed token");
        self.dispatcher.send(&request).await
    }

    /// Await the in-flight refresh, starting one if none is outstanding.
    /// Returns the new session token.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        // Check and set under one lock; no await until the guard is gone
        let pending = {
            let mut guard = lock(&self.slot);
            let slot = &mut *guard;
            match slot.pending {
                Some((generation, ref handle)) => {
                    debug!(generation, "Joining in-flight token refresh");
                    handle.clone()
                }
                None => {
                    slot.generation += 1;
                    let generation = slot.generation;
                    let handle = self.start_refresh(generation);
                    slot.pending = Some((generation, handle.clone()));
                    handle
                }
            }
        };

        pending.await
    }

    fn start_refresh(&self, generation: u64) -> RefreshFuture {
        let dispatcher = Arc::clone(&self.dispatcher);
        let navigator = Arc::clone(&self.navigator);
        let slot = Arc::clone(&self.slot);

        async move {
            info!(generation, "Starting token refresh");
            let outcome = Self::exchange(&dispatcher).await;

            match outcome {
                Ok(_) => info!(generation, "Session token refreshed"),
                Err(ref e) => {
                    warn!(generation, error = %e, "Token refresh failed, ending session");
                    dispatcher.session().clear();
                    navigator.navigate_to_login(Some(SESSION_EXPIRED_MESSAGE));
                }
            }

            let mut slot = lock(&slot);
            if slot.pending.as_ref().map(|(g, _)| *g) == Some(generation) {
                slot.pending = None;
            }

            outcome
        }
        .boxed()
        .shared()
    }

    /// One refresh exchange. Never retried and never re-enters `execute`.
    async fn exchange(dispatcher: &Dispatcher) -> Result<String, ApiError> {
        let refresh_token = dispatcher
            .session()
            .refresh_token()
            .ok_or(ApiError::MissingRefreshToken)?;

        let request = RequestDescriptor::post(REFRESH_PATH)
            .with_json(&RefreshRequest { refresh_token })?
            .refresh_exempt();

        let value = dispatcher.send(&request).await?;
        let response: RefreshResponse = serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e)))?;

        let token = response
            .token
            .ok_or_else(|| ApiError::InvalidResponse("Refresh response did not include a token".to_string()))?;

        let session = dispatcher.session();
        session.set_session_token(&token);
        if let Some(ref rotated) = response.refresh_token {
            session.set_refresh_token(rotated);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::navigation::NavigationBridge;

    fn coordinator(session: Session) -> (SessionRefreshCoordinator, Arc<NavigationBridge>) {
        // Nothing listens here; only paths that never reach the network are exercised
        let dispatcher = Dispatcher::new("http://127.0.0.1:9", session, Duration::from_secs(1))
            .expect("build dispatcher");
        let bridge = Arc::new(NavigationBridge::new());
        let coordinator = SessionRefreshCoordinator::new(Arc::new(dispatcher), bridge.clone());
        (coordinator, bridge)
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_and_clears_session() {
        let session = Session::in_memory();
        session.set_session_token("stale");
        session.set_cached_user(&Default::default());

        let (coordinator, bridge) = coordinator(session.clone());
        let result = coordinator.refresh().await;

        assert!(matches!(result, Err(ApiError::MissingRefreshToken)));
        assert!(session.is_empty());
        assert_eq!(bridge.take_flash_message().as_deref(), Some(SESSION_EXPIRED_MESSAGE));
        assert_eq!(bridge.take_hard_redirect().as_deref(), Some("/auth/login"));
        assert!(!coordinator.is_refresh_in_flight());
    }

    #[tokio::test]
    async fn test_slot_is_cleared_after_each_cycle() {
        let (coordinator, _bridge) = coordinator(Session::in_memory());

        for _ in 0..3 {
            assert!(coordinator.refresh().await.is_err());
            assert!(!coordinator.is_refresh_in_flight());
        }
        assert_eq!(lock(&coordinator.slot).generation, 3);
    }
}
