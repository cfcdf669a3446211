//! Authentication domain types

mod claims;
mod envelope;
mod error;
mod session;
mod token;

pub use claims::{remaining_lifetime, token_expiry};
pub use envelope::login_payload;
pub use error::AuthError;
pub use session::{SessionRecord, SessionStatus, UserProfile};
pub use token::{TokenBundle, bearer, token_preview};
