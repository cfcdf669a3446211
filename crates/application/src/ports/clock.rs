//! Clock port

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Token expiry and the session warning window are computed against this
/// port so tests can move time forward without sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
