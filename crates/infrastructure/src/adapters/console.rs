//! Headless UI adapters.
//!
//! A terminal or daemon host has no router or toast layer; these adapters
//! log notices through `tracing` and keep the current route in memory.

use std::time::Duration;

use parking_lot::Mutex;
use tether_application::ports::{Navigator, Notifier};
use tracing::{error, info, warn};

/// Notifier that writes every notice to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Creates a notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "tether::notice", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "tether::notice", "{message}");
    }

    fn session_expiring(&self, remaining: Duration) {
        warn!(
            target: "tether::notice",
            seconds_remaining = remaining.as_secs(),
            "Your session is about to expire. Run `tether extend` to stay signed in."
        );
    }
}

/// Navigator holding the current route in memory.
#[derive(Debug)]
pub struct MemoryNavigator {
    route: Mutex<String>,
}

impl MemoryNavigator {
    /// Starts at `route`.
    #[must_use]
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(route.into()),
        }
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.route.lock().clone()
    }

    fn redirect(&self, route: &str) {
        info!(from = %self.route.lock(), to = route, "redirect");
        *self.route.lock() = route.to_string();
    }
}
