//! Normalization of the backend's token response envelopes.
//!
//! The backend returns tokens either flat (`{access_token, refresh_token,
//! expires_in}`) or wrapped (`{details: {data: {tokens: {...}}}}`). Both
//! shapes are reduced to a [`TokenBundle`] here so that the ambiguity never
//! travels past the API boundary.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::claims::remaining_lifetime;
use super::error::AuthError;
use super::session::UserProfile;
use super::token::TokenBundle;

const NESTED_TOKENS: &str = "/details/data/tokens";
const NESTED_DATA: &str = "/details/data";

impl TokenBundle {
    /// Extracts a bundle from a refresh response in either envelope shape.
    ///
    /// When `expires_in` is missing the lifetime is taken from the access
    /// token's `exp` claim, then from `fallback_lifetime`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedRefreshResponse`] if neither shape carries
    /// a non-empty access token.
    pub fn from_refresh_response(
        body: &Value,
        now: DateTime<Utc>,
        fallback_lifetime: u64,
    ) -> Result<Self, AuthError> {
        let candidates = [
            body.pointer(NESTED_TOKENS),
            body.pointer("/tokens"),
            Some(body),
        ];

        candidates
            .into_iter()
            .flatten()
            .find_map(|node| bundle_from(node, now, fallback_lifetime))
            .ok_or_else(|| {
                AuthError::MalformedRefreshResponse(
                    "response carries no access_token in flat or nested shape".to_string(),
                )
            })
    }
}

/// Extracts the user profile and tokens from a login/verification response.
///
/// # Errors
///
/// Returns [`AuthError::MalformedRefreshResponse`] if the tokens or the user
/// object are missing.
pub fn login_payload(
    body: &Value,
    now: DateTime<Utc>,
    fallback_lifetime: u64,
) -> Result<(UserProfile, TokenBundle), AuthError> {
    let bundle = TokenBundle::from_refresh_response(body, now, fallback_lifetime)?;

    let user = [body.pointer(NESTED_DATA), Some(body)]
        .into_iter()
        .flatten()
        .filter_map(|node| node.get("user"))
        .find_map(|user| serde_json::from_value::<UserProfile>(user.clone()).ok())
        .ok_or_else(|| {
            AuthError::MalformedRefreshResponse("response carries no user profile".to_string())
        })?;

    Ok((user, bundle))
}

fn bundle_from(node: &Value, now: DateTime<Utc>, fallback_lifetime: u64) -> Option<TokenBundle> {
    let access_token = node
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())?;

    let refresh_token = node
        .get("refresh_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(String::from);

    let expires_in = node
        .get("expires_in")
        .and_then(lifetime_seconds)
        .or_else(|| remaining_lifetime(access_token, now))
        .unwrap_or(fallback_lifetime);

    Some(TokenBundle::new(access_token, refresh_token, expires_in))
}

// Some endpoints send the lifetime as a string.
fn lifetime_seconds(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
