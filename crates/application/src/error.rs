//! Application error types

use thiserror::Error;
use tether_domain::AuthError;

use crate::ports::{StoreError, TransportError};

/// Errors returned to callers of the authenticated client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was obtained (timeout, connection failure).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail.
        message: String,
        /// Raw response body.
        body: Vec<u8>,
    },

    /// Authentication could not be recovered.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Session state could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] StoreError),

    /// A success response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of the failure, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error ended the session.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Auth(err) if err.is_session_expired())
    }
}

/// Result type alias for pipeline operations.
pub type ApiResult<T> = Result<T, ApiError>;
