//! Session termination: clear, notify, redirect.

use std::sync::Arc;

use tether_domain::PipelineSettings;
use tracing::{debug, warn};

use crate::ports::{Navigator, Notifier, SessionStore};

/// Message shown when a session ends without the user logging out.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Ends a session that can no longer be renewed.
///
/// Termination is idempotent: the store is cleared and the notice shown on
/// every call, but the user is only redirected when the current route is
/// not already an unauthenticated page.
pub struct SessionTerminator {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<PipelineSettings>,
}

impl SessionTerminator {
    /// Creates a terminator.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        Self {
            store,
            navigator,
            notifier,
            settings,
        }
    }

    /// Clears the session, shows the expiry notice and redirects to login.
    pub async fn expire(&self, reason: &str) {
        warn!(reason, "session expired");

        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session store");
        }
        self.notifier.error(SESSION_EXPIRED_MESSAGE);

        let current = self.navigator.current_route();
        if self.settings.is_unauthenticated_route(&current) {
            debug!(route = %current, "already on an unauthenticated route, not redirecting");
            return;
        }
        self.navigator.redirect(&self.settings.login_route);
    }
}

impl std::fmt::Debug for SessionTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTerminator")
            .field("login_route", &self.settings.login_route)
            .finish_non_exhaustive()
    }
}
