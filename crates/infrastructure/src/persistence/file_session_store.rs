//! File-based session store.
//!
//! The session lives in two files inside the session directory:
//!
//! - `access_token.json`: the bearer credential with its own expiry, read
//!   as absent once that expiry has passed (cookie semantics).
//! - `session.json`: the full session record, including the refresh token
//!   and the user profile.
//!
//! ```json
//! {
//!   "value": "eyJhbGciOi...",
//!   "expires_at": "2026-01-01T13:00:00Z"
//! }
//! ```
//!
//! Both files are written to a temporary path and renamed into place while
//! the write lock on the in-memory copy is held.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_application::ports::{Clock, SessionStore, StoreError};
use tether_domain::{SessionRecord, TokenBundle, UserProfile, token_preview};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::serialization::to_json_stable_bytes;

/// Name of the access token file.
pub const ACCESS_TOKEN_FILE: &str = "access_token.json";
/// Name of the session record file.
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenCookie {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Session store persisted under a directory.
pub struct FileSessionStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    record: RwLock<Option<SessionRecord>>,
}

impl FileSessionStore {
    /// Opens the store in `dir`, creating the directory if needed and
    /// loading a session left by a previous process.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// session file cannot be read or parsed.
    pub async fn open(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        let mut record: Option<SessionRecord> = read_json(&dir.join(SESSION_FILE)).await?;
        let cookie: Option<AccessTokenCookie> = read_json(&dir.join(ACCESS_TOKEN_FILE)).await?;

        // The cookie only carries its own expiry for the token the record
        // holds. A cookie left behind by an interrupted write names an older
        // token and must not be paired with the record's refresh token.
        if let (Some(record), Some(cookie)) = (record.as_mut(), cookie) {
            if cookie.value == record.access_token {
                record.expires_at = cookie.expires_at;
            } else {
                warn!(
                    dir = %dir.display(),
                    cookie = %token_preview(&cookie.value),
                    token = %token_preview(&record.access_token),
                    "access token file is stale, using the session record"
                );
            }
        }

        if let Some(record) = &record {
            debug!(
                dir = %dir.display(),
                user_id = %record.user.id,
                token = %token_preview(&record.access_token),
                "loaded persisted session"
            );
        }

        Ok(Self {
            dir,
            clock,
            record: RwLock::new(record),
        })
    }

    /// Directory the session files live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn persist(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let cookie = AccessTokenCookie {
            value: record.access_token.clone(),
            expires_at: record.expires_at,
        };
        write_atomic(&self.dir.join(SESSION_FILE), &to_json_stable_bytes(record)?).await?;
        write_atomic(
            &self.dir.join(ACCESS_TOKEN_FILE),
            &to_json_stable_bytes(&cookie)?,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn session(&self) -> Option<SessionRecord> {
        self.record.read().await.clone()
    }

    async fn access_token(&self) -> Option<String> {
        let now = self.clock.now();
        self.record
            .read()
            .await
            .as_ref()
            .filter(|record| record.expires_at > now)
            .map(|record| record.access_token.clone())
    }

    async fn set_tokens(&self, bundle: TokenBundle) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut guard = self.record.write().await;
        let record = match guard.clone() {
            Some(mut record) => {
                record.apply(bundle, now);
                record
            }
            None => SessionRecord::new(UserProfile::anonymous(), bundle, now),
        };

        self.persist(&record).await?;
        debug!(token = %token_preview(&record.access_token), "tokens persisted");
        *guard = Some(record);
        Ok(())
    }

    async fn begin_session(
        &self,
        user: UserProfile,
        bundle: TokenBundle,
    ) -> Result<SessionRecord, StoreError> {
        let record = SessionRecord::new(user, bundle, self.clock.now());
        let mut guard = self.record.write().await;
        self.persist(&record).await?;
        *guard = Some(record.clone());
        Ok(record)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.record.write().await;
        remove_if_exists(&self.dir.join(ACCESS_TOKEN_FILE)).await?;
        remove_if_exists(&self.dir.join(SESSION_FILE)).await?;
        *guard = None;
        Ok(())
    }
}

impl std::fmt::Debug for FileSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSessionStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await
}

async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
