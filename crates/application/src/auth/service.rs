//! Login and logout flows, the explicit writers of the session store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tether_domain::{ApiRequest, PipelineSettings, SessionRecord, UserProfile, login_payload};
use tracing::{info, warn};

use super::client::into_result;
use crate::error::{ApiError, ApiResult};
use crate::ports::{Clock, HttpTransport, SessionStore};

/// Email/password credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Login email.
    pub email: String,
    /// Plain-text password, sent over TLS only.
    pub password: String,
}

/// Establishes and ends sessions.
pub struct SessionService {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    settings: Arc<PipelineSettings>,
}

impl SessionService {
    /// Creates a service.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        Self {
            transport,
            store,
            clock,
            settings,
        }
    }

    /// Logs in and stores the new session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for rejected credentials,
    /// [`ApiError::Auth`] for a response without tokens or user, and
    /// [`ApiError::Storage`] if the session cannot be persisted.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<SessionRecord> {
        let body = serde_json::to_value(credentials).map_err(|err| ApiError::Decode(err.to_string()))?;
        let request = ApiRequest::post(&self.settings.login_path, body)
            .skip_auth()
            .with_timeout(self.settings.request_timeout());

        let response = into_result(self.transport.execute(request).await?)?;
        let body: Value = response
            .json()
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let (user, bundle) = login_payload(
            &body,
            self.clock.now(),
            self.settings.default_token_lifetime_secs,
        )?;

        let session = self.store.begin_session(user, bundle).await?;
        info!(user_id = %session.user.id, "session started");
        Ok(session)
    }

    /// Ends the session.
    ///
    /// The server is told to revoke the refresh token on a best-effort
    /// basis; local session data is cleared whatever the server answers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Storage`] if local data cannot be removed.
    pub async fn logout(&self) -> ApiResult<()> {
        if let Some(refresh_token) = self.store.refresh_token().await {
            let request = ApiRequest::post(
                &self.settings.logout_path,
                json!({ "refresh_token": refresh_token }),
            )
            .skip_auth()
            .with_timeout(self.settings.request_timeout());

            match self.transport.execute(request).await {
                Ok(response) if response.is_success() => {}
                Ok(response) => warn!(status = response.status, "logout rejected by server"),
                Err(err) => warn!(error = %err, "logout request failed"),
            }
        }

        self.store.clear().await?;
        info!("session ended");
        Ok(())
    }

    /// Profile of the signed-in user.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.store.session().await.map(|session| session.user)
    }
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("login_path", &self.settings.login_path)
            .finish_non_exhaustive()
    }
}
