//! Pipeline settings
//!
//! Every field has a default so that a partial configuration file only
//! needs to name what it overrides.

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Settings of the authenticated request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Base URL every request path is joined to.
    pub base_url: String,
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Path of the login endpoint.
    pub login_path: String,
    /// Path of the logout endpoint.
    pub logout_path: String,
    /// Timeout applied to every request, in seconds.
    pub request_timeout_secs: u64,
    /// How often the expiry notifier checks the session, in seconds.
    pub poll_interval_secs: u64,
    /// How long before expiry the user is warned, in seconds.
    pub warning_window_secs: u64,
    /// Lifetime assumed when a token response carries none, in seconds.
    pub default_token_lifetime_secs: u64,
    /// Route the user is sent to when the session ends.
    pub login_route: String,
    /// Routes that never trigger a redirect to `login_route`.
    pub unauthenticated_routes: Vec<String>,
    /// Directory for persisted session files; platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            refresh_path: "/refresh".to_string(),
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
            request_timeout_secs: 60,
            poll_interval_secs: 10,
            warning_window_secs: 120,
            default_token_lifetime_secs: 3600,
            login_route: "/login".to_string(),
            unauthenticated_routes: ["/login", "/signup", "/forgot-password", "/verify"]
                .into_iter()
                .map(String::from)
                .collect(),
            session_dir: None,
        }
    }
}

impl PipelineSettings {
    /// Checks ranges and required values.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidSetting`] for the first invalid field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(invalid("base_url", "must not be empty"));
        }
        if !self.refresh_path.starts_with('/') {
            return Err(invalid("refresh_path", "must start with '/'"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than zero"));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "must be greater than zero"));
        }
        if self.warning_window_secs == 0 {
            return Err(invalid("warning_window_secs", "must be greater than zero"));
        }
        if !self.login_route.starts_with('/') {
            return Err(invalid("login_route", "must start with '/'"));
        }
        Ok(())
    }

    /// Timeout applied to every request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval between expiry checks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Warning window as a signed delta, for comparisons with timestamps.
    #[must_use]
    pub fn warning_window(&self) -> TimeDelta {
        i64::try_from(self.warning_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Whether `route` is a page reachable without a session.
    ///
    /// Matches the route itself and anything nested below it, so
    /// `/verify/abc` counts as `/verify`.
    #[must_use]
    pub fn is_unauthenticated_route(&self, route: &str) -> bool {
        let route = route.split(['?', '#']).next().unwrap_or(route);
        self.unauthenticated_routes
            .iter()
            .chain(std::iter::once(&self.login_route))
            .any(|entry| {
                route == entry
                    || route
                        .strip_prefix(entry.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }
}

fn invalid(name: &'static str, reason: &str) -> DomainError {
    DomainError::InvalidSetting {
        name,
        reason: reason.to_string(),
    }
}
