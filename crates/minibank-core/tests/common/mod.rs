//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use minibank_core::models::User;
use minibank_core::{BankingClient, Navigator, Session};
use wiremock::{Match, MockServer, Request};

/// Records every login redirect instead of navigating.
#[derive(Default)]
pub struct RecordingNavigator {
    calls: Mutex<Vec<Option<String>>>,
}

impl RecordingNavigator {
    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().expect("lock navigator calls").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to_login(&self, message: Option<&str>) {
        self.calls
            .lock()
            .expect("lock navigator calls")
            .push(message.map(str::to_string));
    }
}

/// Matches requests that carry no Authorization header.
pub struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

pub fn cached_user() -> User {
    User {
        id: Some("550e8400-e29b-41d4-a716-446655440000".to_string()),
        username: Some("john_doe".to_string()),
        email: Some("john.doe@example.com".to_string()),
        ..Default::default()
    }
}

/// A session that was logged in and whose session token has since expired.
pub fn logged_in_session() -> Session {
    let session = Session::in_memory();
    session.set_session_token("old-token");
    session.set_refresh_token("refresh-1");
    session.set_cached_user(&cached_user());
    session
}

pub fn client_for(server: &MockServer, session: Session) -> (BankingClient, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let client = BankingClient::connect(server.uri(), session, navigator.clone(), Duration::from_secs(5))
        .expect("build banking client");
    (client, navigator)
}

pub fn account_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "number": "ACC123456",
        "name": "My Savings Account",
        "accountType": "TRY",
        "balance": 1500.50
    })
}
