//! HTTP transport port

use async_trait::async_trait;
use thiserror::Error;
use tether_domain::{ApiRequest, ApiResponse};

/// Errors raised when a request produced no HTTP response at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// Port for sending requests to the backend.
///
/// Implementations return `Ok` for every HTTP response, whatever its
/// status. Only failures to obtain a response are errors. Transports never
/// attach credentials themselves.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and returns the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on timeout, connection failure or an
    /// unusable URL.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
