//! Login redirects for code that has no handle on the UI.
//!
//! The refresh coordinator only knows the `Navigator` trait. The
//! `NavigationBridge` implementation forwards to whatever handler the front
//! end registered at startup and keeps the one-time flash message the login
//! view shows after a forced logout.

use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use crate::utils::lock;

/// Route of the login view
pub const LOGIN_ROUTE: &str = "/auth/login";

/// Where to go and whether to replace the current history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub route: String,
    pub replace: bool,
}

impl NavigationTarget {
    pub fn login() -> Self {
        Self {
            route: LOGIN_ROUTE.to_string(),
            replace: true,
        }
    }
}

pub trait Navigator: Send + Sync {
    /// Send the user to the login view, optionally with a message for it to
    /// display once.
    fn navigate_to_login(&self, message: Option<&str>);
}

type Handler = Arc<dyn Fn(&NavigationTarget) + Send + Sync>;

#[derive(Default)]
pub struct NavigationBridge {
    handler: RwLock<Option<Handler>>,
    flash_message: Mutex<Option<String>>,
    hard_redirect: Mutex<Option<String>>,
}

impl NavigationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the active navigation callback, replacing any previous one.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&NavigationTarget) + Send + Sync + 'static,
    {
        let mut slot = self.handler.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(Arc::new(handler));
    }

    pub fn has_handler(&self) -> bool {
        self.handler
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn go_to_login(&self, message: Option<&str>) {
        if let Some(message) = message {
            *lock(&self.flash_message) = Some(message.to_string());
        }

        let target = NavigationTarget::login();
        // Clone out of the lock so a handler may call back into the bridge
        let handler = self
            .handler
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        match handler {
            Some(handler) => {
                debug!(route = %target.route, "Navigating to login");
                handler(&target);
            }
            None => {
                info!(route = %target.route, "No navigation handler, falling back to full navigation");
                *lock(&self.hard_redirect) = Some(target.route);
            }
        }
    }

    /// Read and clear the pending login message.
    pub fn take_flash_message(&self) -> Option<String> {
        lock(&self.flash_message).take()
    }

    /// Read and clear the location of a fallback full navigation.
    pub fn take_hard_redirect(&self) -> Option<String> {
        lock(&self.hard_redirect).take()
    }
}

impl Navigator for NavigationBridge {
    fn navigate_to_login(&self, message: Option<&str>) {
        self.go_to_login(message);
    }
}
