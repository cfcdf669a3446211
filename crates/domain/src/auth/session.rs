//! Session record and its derived status.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::token::TokenBundle;

/// Identity fields of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier (numeric ids are kept as strings).
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name, if the user set one.
    #[serde(default)]
    pub name: Option<String>,
}

impl UserProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
        }
    }

    /// Placeholder identity used when tokens are stored without a login.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new("", "")
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// A user's tokens plus expiry metadata, from login until logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Who the session belongs to.
    pub user: UserProfile,
    /// Current bearer credential.
    pub access_token: String,
    /// Credential used to mint the next access token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Absolute expiry of `access_token`.
    pub expires_at: DateTime<Utc>,
    /// When the session was established.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Starts a session from a freshly issued bundle.
    #[must_use]
    pub fn new(user: UserProfile, bundle: TokenBundle, now: DateTime<Utc>) -> Self {
        Self {
            user,
            expires_at: bundle.expires_at(now),
            access_token: bundle.access_token,
            refresh_token: bundle.refresh_token,
            created_at: now,
        }
    }

    /// Replaces the token triple in place; identity and creation time stay.
    ///
    /// A bundle without a refresh token keeps the current one.
    pub fn apply(&mut self, bundle: TokenBundle, now: DateTime<Utc>) {
        self.expires_at = bundle.expires_at(now);
        self.access_token = bundle.access_token;
        if let Some(refresh) = bundle.refresh_token {
            self.refresh_token = Some(refresh);
        }
    }

    /// Time left until `expires_at` (negative once expired).
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        self.expires_at - now
    }

    /// Check if the token can be refreshed.
    #[must_use]
    pub const fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Classifies the session for display.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>, warning_window: TimeDelta) -> SessionStatus {
        let remaining = self.remaining(now);
        if remaining <= TimeDelta::zero() {
            SessionStatus::Expired {
                can_refresh: self.can_refresh(),
            }
        } else if remaining <= warning_window {
            SessionStatus::Expiring {
                seconds_remaining: remaining.num_seconds(),
                can_refresh: self.can_refresh(),
            }
        } else {
            SessionStatus::Valid {
                seconds_remaining: remaining.num_seconds(),
            }
        }
    }
}

/// Status of a session for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session is stored.
    NotAuthenticated,
    /// Session is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Session is inside the warning window.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
        /// Whether the session can be extended.
        can_refresh: bool,
    },
    /// Session has expired.
    Expired {
        /// Whether the session can still be refreshed.
        can_refresh: bool,
    },
}

impl SessionStatus {
    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not authenticated".to_string(),
            Self::Valid { seconds_remaining } => {
                let secs = *seconds_remaining;
                if secs > 3600 {
                    format!("Valid for {} hours", secs / 3600)
                } else if secs > 60 {
                    format!("Valid for {} minutes", secs / 60)
                } else {
                    format!("Valid for {secs} seconds")
                }
            }
            Self::Expiring {
                seconds_remaining,
                can_refresh,
            } => {
                let hint = if *can_refresh { " (can be extended)" } else { "" };
                format!("Expiring in {seconds_remaining} seconds{hint}")
            }
            Self::Expired { .. } => "Expired".to_string(),
        }
    }
}
