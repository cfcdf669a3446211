//! Authentication errors.

use thiserror::Error;

/// Errors raised while acquiring, refreshing or expiring a session.
///
/// The type is `Clone` because a single refresh failure is delivered to
/// every request that was queued behind it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No refresh token is stored, so the session cannot be renewed.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status.
    #[error("refresh rejected with status {status}: {message}")]
    RefreshRejected {
        /// HTTP status returned by the refresh endpoint.
        status: u16,
        /// Server-provided detail, if any.
        message: String,
    },

    /// A login or refresh response did not carry a usable access token.
    #[error("malformed token response: {0}")]
    MalformedRefreshResponse(String),

    /// The refresh call never produced a response.
    #[error("network error during refresh: {0}")]
    Network(String),

    /// The refreshed tokens could not be written to the session store.
    #[error("failed to persist tokens: {0}")]
    Storage(String),

    /// The session is over; the user has to authenticate again.
    #[error("session expired: {reason}")]
    SessionExpired {
        /// The failure that ended the session.
        reason: String,
    },

    /// The refresh cycle was abandoned before it settled.
    #[error("token refresh was cancelled")]
    Cancelled,
}

impl AuthError {
    /// Wraps a refresh failure into the error handed to every waiting caller.
    #[must_use]
    pub fn into_session_expired(self) -> Self {
        match self {
            Self::SessionExpired { .. } => self,
            other => Self::SessionExpired {
                reason: other.to_string(),
            },
        }
    }

    /// Returns true if the error means the user has to log in again.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }
}
