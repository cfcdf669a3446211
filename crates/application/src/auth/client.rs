//! Authenticated API client: request and response interception.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tether_domain::{ApiRequest, ApiResponse, token_preview};
use tracing::{debug, info};

use super::coordinator::RefreshCoordinator;
use crate::error::{ApiError, ApiResult};
use crate::ports::{HttpTransport, SessionStore};

/// HTTP client that attaches the session's bearer token and recovers from
/// 401/403 responses through the shared [`RefreshCoordinator`].
///
/// Success responses pass through unchanged. Other failures, timeouts and
/// requests flagged `skip_auth` are returned to the caller without any
/// refresh attempt.
#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
    timeout: Duration,
}

impl AuthenticatedClient {
    /// Creates a client.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        coordinator: Arc<RefreshCoordinator>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
            timeout,
        }
    }

    /// The coordinator this client recovers through.
    #[must_use]
    pub const fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Attaches the stored access token unless the request skips auth.
    ///
    /// Expiry is not checked locally; the server's 401/403 is the only
    /// signal that a token is no longer accepted.
    pub async fn authorize(&self, mut request: ApiRequest) -> ApiRequest {
        if request.skip_auth {
            return request;
        }
        if let Some(token) = self.store.access_token().await {
            debug!(request_id = %request.id, token = %token_preview(&token), "attaching bearer token");
            request.set_bearer(&token);
        }
        request
    }

    /// Sends `request`, refreshing the session and retrying once if the
    /// server rejects its credentials.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Transport`] when no response was obtained
    /// - [`ApiError::Status`] for non-success responses that are not
    ///   recovered
    /// - [`ApiError::Auth`] when the session could not be refreshed
    pub async fn send(&self, mut request: ApiRequest) -> ApiResult<ApiResponse> {
        if request.timeout.is_none() {
            request.timeout = Some(self.timeout);
        }

        let sent = self.authorize(request.clone()).await;
        let rejected_token = sent.bearer_token().map(String::from);
        let response = self.transport.execute(sent).await?;

        if request.skip_auth || !response.is_auth_failure() {
            return into_result(response);
        }

        info!(
            request_id = %request.id,
            status = response.status,
            detail = %response.error_message(),
            "credentials rejected, recovering session"
        );
        let token = self.coordinator.recover(rejected_token.as_deref()).await?;

        let mut retry = request;
        retry.set_bearer(&token);
        debug!(request_id = %retry.id, "retrying with refreshed token");

        // A second rejection is returned as-is; each request is retried once.
        into_result(self.transport.execute(retry).await?)
    }

    /// Sends a GET request and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send); also [`ApiError::Decode`] for an
    /// undecodable body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(ApiRequest::get(path)).await?;
        response
            .json()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Sends a POST request with a JSON body and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self.send(ApiRequest::post(path, body)).await?;
        response
            .json()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

impl std::fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

pub(crate) fn into_result(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: response.status,
            message: response.error_message(),
            body: response.body,
        })
    }
}
