//! Token bundle produced by login and refresh calls.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair with a relative lifetime.
///
/// This is the single internal shape every token-producing response is
/// normalized into before it reaches the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// Bearer credential attached to authenticated requests.
    pub access_token: String,
    /// Rotated refresh token, if the server issued a new one.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: u64,
}

impl TokenBundle {
    /// Creates a new bundle.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: u64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in,
        }
    }

    /// Absolute expiry of the access token when issued at `now`.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Formats a bearer credential.
#[must_use]
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Get a preview of a token (first 8 chars + ...) safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.chars().count() > 12 {
        let head: String = token.chars().take(8).collect();
        format!("{head}...")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expires_at_adds_lifetime() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let bundle = TokenBundle::new("abc", None, 90);
        assert_eq!(
            bundle.expires_at(now),
            Utc.with_ymd_and_hms(2026, 1, 1, 12, 1, 30).unwrap()
        );
    }

    #[test]
    fn expires_at_saturates_on_absurd_lifetime() {
        let now = Utc::now();
        let bundle = TokenBundle::new("abc", None, u64::MAX);
        assert_eq!(bundle.expires_at(now), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn preview_truncates_long_tokens() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }
}
