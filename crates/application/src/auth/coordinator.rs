//! Single-flight token refresh.
//!
//! At most one refresh call is in flight at any instant. Requests whose
//! authentication fails while a refresh is running are queued and settled,
//! in arrival order and all with the same outcome, when that refresh ends.
//!
//! The phase flag and the queue live behind one mutex that is never held
//! across an `.await`; every transition happens synchronously between
//! suspension points.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tether_domain::{ApiRequest, AuthError, PipelineSettings, TokenBundle, token_preview};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::terminator::SessionTerminator;
use crate::ports::{Clock, HttpTransport, SessionStore};

type Waiter = oneshot::Sender<Result<String, AuthError>>;

/// Whether a refresh call is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    /// No refresh in flight.
    #[default]
    Idle,
    /// A refresh call is in flight; auth failures are queued.
    Refreshing,
}

#[derive(Default)]
struct CoordinatorState {
    phase: RefreshPhase,
    pending: Vec<Waiter>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<Result<String, AuthError>>),
}

/// Coordinates token refreshes for one process.
///
/// Construct once and share it (behind an `Arc`) between every client that
/// talks to the same backend.
pub struct RefreshCoordinator {
    state: Mutex<CoordinatorState>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    terminator: Arc<SessionTerminator>,
    clock: Arc<dyn Clock>,
    refresh_path: String,
    timeout: Duration,
    fallback_lifetime: u64,
    refresh_calls: AtomicU64,
}

impl RefreshCoordinator {
    /// Creates a coordinator in the idle phase.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        terminator: Arc<SessionTerminator>,
        clock: Arc<dyn Clock>,
        settings: &PipelineSettings,
    ) -> Self {
        Self {
            state: Mutex::new(CoordinatorState::default()),
            transport,
            store,
            terminator,
            clock,
            refresh_path: settings.refresh_path.clone(),
            timeout: settings.request_timeout(),
            fallback_lifetime: settings.default_token_lifetime_secs,
            refresh_calls: AtomicU64::new(0),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RefreshPhase {
        self.state.lock().phase
    }

    /// Number of requests waiting on the in-flight refresh.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of refresh network calls issued so far.
    #[must_use]
    pub fn refresh_calls(&self) -> u64 {
        self.refresh_calls.load(Ordering::Relaxed)
    }

    /// Obtains a usable access token after a request was rejected with
    /// 401/403 while carrying `rejected_token`.
    ///
    /// If the stored token already differs from the rejected one, a refresh
    /// finished after that request was sent and the stored token is returned
    /// without a new cycle. Otherwise the caller joins the in-flight refresh
    /// or starts one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] when the refresh fails, or
    /// [`AuthError::Cancelled`] if the refresh was abandoned.
    pub async fn recover(&self, rejected_token: Option<&str>) -> Result<String, AuthError> {
        // Phase first: a cycle that completes during the store read must not
        // make a stale read look idle.
        if self.phase() == RefreshPhase::Refreshing {
            return self.refresh_now().await;
        }

        if let Some(current) = self.store.access_token().await
            && rejected_token != Some(current.as_str())
        {
            debug!(
                token = %token_preview(&current),
                "token rotated since request was sent, retrying with current token"
            );
            return Ok(current);
        }

        self.refresh_now().await
    }

    /// Refreshes the access token, joining an in-flight refresh if there is
    /// one.
    ///
    /// This is also the path of the user-initiated "extend session" action,
    /// so a manual extension never races an automatic refresh.
    ///
    /// # Errors
    ///
    /// See [`recover`](Self::recover).
    pub async fn refresh_now(&self) -> Result<String, AuthError> {
        let role = {
            let mut state = self.state.lock();
            match state.phase {
                RefreshPhase::Refreshing => {
                    let (tx, rx) = oneshot::channel();
                    state.pending.push(tx);
                    debug!(queued = state.pending.len(), "refresh in flight, queueing request");
                    Role::Follower(rx)
                }
                RefreshPhase::Idle => {
                    state.phase = RefreshPhase::Refreshing;
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(rx) => rx.await.unwrap_or(Err(AuthError::Cancelled)),
            Role::Leader => self.lead_cycle().await,
        }
    }

    async fn lead_cycle(&self) -> Result<String, AuthError> {
        let cycle = CycleGuard {
            state: &self.state,
            armed: true,
        };

        let outcome = self.perform_refresh().await;
        let waiters = cycle.finish();

        match outcome {
            Ok(token) => {
                info!(
                    token = %token_preview(&token),
                    released = waiters.len(),
                    "access token refreshed"
                );
                for waiter in waiters {
                    // A dropped receiver means that caller went away.
                    let _ = waiter.send(Ok(token.clone()));
                }
                Ok(token)
            }
            Err(err) => {
                let expired = err.into_session_expired();
                warn!(error = %expired, rejected = waiters.len(), "token refresh failed");
                for waiter in waiters {
                    let _ = waiter.send(Err(expired.clone()));
                }
                self.terminator.expire(&expired.to_string()).await;
                Err(expired)
            }
        }
    }

    async fn perform_refresh(&self) -> Result<String, AuthError> {
        let Some(refresh_token) = self.store.refresh_token().await else {
            return Err(AuthError::MissingRefreshToken);
        };

        self.refresh_calls.fetch_add(1, Ordering::Relaxed);
        info!(path = %self.refresh_path, "refreshing access token");

        // Sent straight to the transport: the refresh call carries the
        // refresh token in its body, never a bearer header.
        let request = ApiRequest::post(&self.refresh_path, json!({ "refresh_token": refresh_token }))
            .skip_auth()
            .with_timeout(self.timeout);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|err| AuthError::Network(err.to_string()))?;

        if !response.is_success() {
            return Err(AuthError::RefreshRejected {
                status: response.status,
                message: response.error_message(),
            });
        }

        let body: Value = response
            .json()
            .map_err(|err| AuthError::MalformedRefreshResponse(err.to_string()))?;
        let bundle =
            TokenBundle::from_refresh_response(&body, self.clock.now(), self.fallback_lifetime)?;
        let access_token = bundle.access_token.clone();

        self.store
            .set_tokens(bundle)
            .await
            .map_err(|err| AuthError::Storage(err.to_string()))?;

        Ok(access_token)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RefreshCoordinator")
            .field("phase", &state.phase)
            .field("pending", &state.pending.len())
            .field("refresh_path", &self.refresh_path)
            .finish_non_exhaustive()
    }
}

/// Returns the coordinator to `Idle` when a cycle ends.
///
/// If the leader's future is dropped mid-refresh the guard still resets the
/// phase and rejects the queue, so no entry outlives its cycle.
struct CycleGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
    armed: bool,
}

impl CycleGuard<'_> {
    fn finish(mut self) -> Vec<Waiter> {
        self.armed = false;
        release(self.state)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let waiters = release(self.state);
            warn!(rejected = waiters.len(), "refresh abandoned before it settled");
            for waiter in waiters {
                let _ = waiter.send(Err(AuthError::Cancelled));
            }
        }
    }
}

fn release(state: &Mutex<CoordinatorState>) -> Vec<Waiter> {
    let mut state = state.lock();
    state.phase = RefreshPhase::Idle;
    std::mem::take(&mut state.pending)
}
