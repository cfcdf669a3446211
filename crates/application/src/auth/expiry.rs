//! Session expiry notifier.
//!
//! Polls the stored session independently of the request path and warns
//! once per expiry before the session runs out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tether_domain::{AuthError, PipelineSettings};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::coordinator::RefreshCoordinator;
use super::terminator::SessionTerminator;
use crate::ports::{Clock, Notifier, SessionStore};

/// Message shown after the user extended the session.
pub const SESSION_EXTENDED_MESSAGE: &str = "Session extended.";

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// No session is stored.
    NoSession,
    /// The session is outside the warning window.
    Healthy {
        /// Time left before expiry.
        remaining: Duration,
    },
    /// A warning was raised by this poll.
    Warned {
        /// Time left before expiry.
        remaining: Duration,
    },
    /// A warning for this expiry is already pending.
    AlreadyWarned,
    /// The session ran out and was terminated.
    Expired,
}

/// Raises a one-shot warning shortly before the session expires.
pub struct SessionExpiryNotifier {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    coordinator: Arc<RefreshCoordinator>,
    terminator: Arc<SessionTerminator>,
    poll_interval: Duration,
    warning_window: TimeDelta,
    // Expiry the pending warning was raised for.
    warned_for: Mutex<Option<DateTime<Utc>>>,
}

impl SessionExpiryNotifier {
    /// Creates a notifier using the settings' poll interval and window.
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        coordinator: Arc<RefreshCoordinator>,
        terminator: Arc<SessionTerminator>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            coordinator,
            terminator,
            poll_interval: settings.poll_interval(),
            warning_window: settings.warning_window(),
            warned_for: Mutex::new(None),
        }
    }

    /// Whether a warning is currently displayed.
    #[must_use]
    pub fn is_warning_pending(&self) -> bool {
        self.warned_for.lock().is_some()
    }

    /// Checks the session once.
    ///
    /// A warning is raised when `0 < remaining <= warning_window` and none
    /// is pending for the same expiry. A renewed or replaced session has a
    /// different expiry, which re-arms the warning. A session that has run
    /// out is terminated.
    pub async fn poll_once(&self) -> ExpiryCheck {
        let Some(session) = self.store.session().await else {
            *self.warned_for.lock() = None;
            return ExpiryCheck::NoSession;
        };

        let remaining = session.remaining(self.clock.now());
        if remaining <= TimeDelta::zero() {
            *self.warned_for.lock() = None;
            self.terminator.expire("session lifetime elapsed").await;
            return ExpiryCheck::Expired;
        }

        let remaining_std = remaining.to_std().unwrap_or_default();
        {
            let mut warned_for = self.warned_for.lock();
            if warned_for.is_some_and(|expiry| expiry != session.expires_at) {
                *warned_for = None;
            }
            if remaining > self.warning_window {
                return ExpiryCheck::Healthy {
                    remaining: remaining_std,
                };
            }
            if warned_for.is_some() {
                return ExpiryCheck::AlreadyWarned;
            }
            *warned_for = Some(session.expires_at);
        }

        info!(seconds_remaining = remaining.num_seconds(), "session about to expire");
        self.notifier.session_expiring(remaining_std);
        ExpiryCheck::Warned {
            remaining: remaining_std,
        }
    }

    /// Polls on the configured interval until `shutdown` turns true or its
    /// sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let check = self.poll_once().await;
                    debug!(?check, "session expiry poll");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("session expiry notifier stopped");
                        break;
                    }
                }
            }
        }
    }

    /// The "extend session" action of the expiry prompt.
    ///
    /// Goes through the shared coordinator, so it joins an automatic
    /// refresh that is already running instead of issuing a second call.
    ///
    /// # Errors
    ///
    /// Returns the coordinator's error; the session has then been
    /// terminated.
    pub async fn extend_session(&self) -> Result<(), AuthError> {
        self.coordinator.refresh_now().await?;
        *self.warned_for.lock() = None;
        self.notifier.success(SESSION_EXTENDED_MESSAGE);
        Ok(())
    }
}

impl std::fmt::Debug for SessionExpiryNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionExpiryNotifier")
            .field("poll_interval", &self.poll_interval)
            .field("warning_window", &self.warning_window)
            .finish_non_exhaustive()
    }
}
