//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A header name or value cannot be sent.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A pipeline setting is out of range or missing.
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting {
        /// Name of the offending setting.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
