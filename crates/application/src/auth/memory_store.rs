//! In-memory session storage.
//!
//! Holds the session record behind a single lock so the token triple is
//! always replaced as a unit. Used by tests and by hosts that keep the
//! session only for the lifetime of the process.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tether_domain::{SessionRecord, TokenBundle, UserProfile};

use crate::ports::{Clock, SessionStore, StoreError};

/// Thread-safe in-memory session store.
#[derive(Clone)]
pub struct MemorySessionStore {
    record: Arc<RwLock<Option<SessionRecord>>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            record: Arc::new(RwLock::new(None)),
            clock,
        }
    }
}

impl std::fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySessionStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn session(&self) -> Option<SessionRecord> {
        self.record.read().await.clone()
    }

    async fn set_tokens(&self, bundle: TokenBundle) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut record = self.record.write().await;
        match record.as_mut() {
            Some(session) => session.apply(bundle, now),
            None => *record = Some(SessionRecord::new(UserProfile::anonymous(), bundle, now)),
        }
        Ok(())
    }

    async fn begin_session(
        &self,
        user: UserProfile,
        bundle: TokenBundle,
    ) -> Result<SessionRecord, StoreError> {
        let session = SessionRecord::new(user, bundle, self.clock.now());
        *self.record.write().await = Some(session.clone());
        Ok(session)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.record.write().await = None;
        Ok(())
    }
}
