//! Reads the expiry claim embedded in a JWT access token.
//!
//! The signature is never checked here; the server is the authority on
//! validity. The claim is only used to estimate a lifetime when a token
//! response omits `expires_in`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Returns the `exp` claim of a JWT, or `None` if the token is opaque.
#[must_use]
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Seconds between `now` and the token's `exp` claim, if it lies in the future.
#[must_use]
pub fn remaining_lifetime(token: &str, now: DateTime<Utc>) -> Option<u64> {
    let expiry = token_expiry(token)?;
    u64::try_from((expiry - now).num_seconds()).ok()
}
