//! Session store port
//!
//! The single place session data is read from and written to. Nothing else
//! in the pipeline knows how or where tokens are persisted.

use async_trait::async_trait;
use thiserror::Error;
use tether_domain::{SessionRecord, TokenBundle, UserProfile};

/// Errors raised by session store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted session state: the token triple plus the user profile.
///
/// Every write replaces the access token, refresh token and expiry as one
/// unit; a reader never observes a new access token next to a stale expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The full session record, if a session exists.
    async fn session(&self) -> Option<SessionRecord>;

    /// The access token attached to outbound requests.
    async fn access_token(&self) -> Option<String> {
        self.session().await.map(|session| session.access_token)
    }

    /// The refresh token used to mint the next access token.
    async fn refresh_token(&self) -> Option<String> {
        self.session().await.and_then(|session| session.refresh_token)
    }

    /// Replaces the token triple, computing the expiry from `expires_in`.
    ///
    /// Without an existing session the tokens are stored under an anonymous
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    async fn set_tokens(&self, bundle: TokenBundle) -> Result<(), StoreError>;

    /// Starts a new session after login or signup verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted.
    async fn begin_session(
        &self,
        user: UserProfile,
        bundle: TokenBundle,
    ) -> Result<SessionRecord, StoreError>;

    /// Removes all session data.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted data cannot be removed.
    async fn clear(&self) -> Result<(), StoreError>;
}
