//! Test doubles shared by the pipeline integration tests.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tether_application::ports::{
    Clock, HttpTransport, Navigator, Notifier, SessionStore, TransportError,
};
use tether_application::{MemorySessionStore, Pipeline, PipelinePorts, RefreshCoordinator};
use tether_domain::{ApiRequest, ApiResponse, PipelineSettings, TokenBundle, UserProfile};
use tokio::sync::Notify;

pub const INITIAL_ACCESS: &str = "access-1";
pub const INITIAL_REFRESH: &str = "refresh-1";
pub const PASSWORD: &str = "correct horse";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(
            DateTime::from_timestamp(1_767_268_800, 0).unwrap(),
        ))
    }

    pub fn advance(&self, seconds: i64) {
        *self.0.lock() += TimeDelta::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

/// How the fake backend answers `POST /refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Flat,
    Nested,
    NetworkError,
    Rejected,
    Malformed,
}

#[derive(Debug)]
struct BackendState {
    valid_token: Option<String>,
    issued: u32,
    mode: RefreshMode,
    log: Vec<ApiRequest>,
}

/// Fake backend: accepts exactly one access token at a time and rotates it
/// on every successful refresh.
#[derive(Debug)]
pub struct ScriptedTransport {
    state: Mutex<BackendState>,
    hold_refresh: AtomicBool,
    release: Notify,
}

impl ScriptedTransport {
    pub fn new(mode: RefreshMode) -> Self {
        Self {
            state: Mutex::new(BackendState {
                valid_token: None,
                issued: 1,
                mode,
                log: Vec::new(),
            }),
            hold_refresh: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    /// Makes refresh calls wait until [`release_refresh`](Self::release_refresh).
    pub fn hold_refreshes(&self) {
        self.hold_refresh.store(true, Ordering::SeqCst);
    }

    pub fn release_refresh(&self) {
        self.hold_refresh.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn accept(&self, token: &str) {
        self.state.lock().valid_token = Some(token.to_string());
    }

    pub fn revoke_all(&self) {
        self.state.lock().valid_token = None;
    }

    pub fn log(&self) -> Vec<ApiRequest> {
        self.state.lock().log.clone()
    }

    pub fn refresh_requests(&self) -> usize {
        self.log().iter().filter(|r| r.path == "/refresh").count()
    }

    fn issue(&self) -> (String, String) {
        let mut state = self.state.lock();
        state.issued += 1;
        let access = format!("access-{}", state.issued);
        let refresh = format!("refresh-{}", state.issued);
        state.valid_token = Some(access.clone());
        (access, refresh)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mode = {
            let mut state = self.state.lock();
            state.log.push(request.clone());
            state.mode
        };

        match request.path.as_str() {
            "/refresh" => {
                if self.hold_refresh.load(Ordering::SeqCst) {
                    self.release.notified().await;
                }
                match mode {
                    RefreshMode::Flat => {
                        let (access, refresh) = self.issue();
                        Ok(ApiResponse::json_body(
                            200,
                            &json!({"access_token": access, "refresh_token": refresh, "expires_in": 3600}),
                        ))
                    }
                    RefreshMode::Nested => {
                        let (access, refresh) = self.issue();
                        Ok(ApiResponse::json_body(
                            200,
                            &json!({"details": {"data": {"tokens": {
                                "access_token": access,
                                "refresh_token": refresh,
                                "expires_in": 3600
                            }}}}),
                        ))
                    }
                    RefreshMode::NetworkError => {
                        Err(TransportError::Connection("connection reset by peer".to_string()))
                    }
                    RefreshMode::Rejected => Ok(ApiResponse::json_body(
                        401,
                        &json!({"detail": "Token is invalid or expired"}),
                    )),
                    RefreshMode::Malformed => Ok(ApiResponse::json_body(
                        200,
                        &json!({"details": {"data": {}}}),
                    )),
                }
            }
            "/login" => {
                let body = request.body.clone().unwrap_or_default();
                if body.get("password").and_then(serde_json::Value::as_str) != Some(PASSWORD) {
                    return Ok(ApiResponse::json_body(
                        400,
                        &json!({"detail": "Invalid email or password."}),
                    ));
                }
                let (access, refresh) = self.issue();
                Ok(ApiResponse::json_body(
                    200,
                    &json!({"details": {"data": {
                        "user": {"id": 7, "email": body["email"], "name": "Ada"},
                        "tokens": {"access_token": access, "refresh_token": refresh, "expires_in": 900}
                    }}}),
                ))
            }
            "/logout" => {
                self.revoke_all();
                Ok(ApiResponse::json_body(200, &json!({"detail": "Logged out."})))
            }
            "/slow" => Err(TransportError::Timeout { timeout_ms: 60_000 }),
            "/missing" => Ok(ApiResponse::json_body(404, &json!({"detail": "Not found."}))),
            "/forbidden" => Ok(ApiResponse::json_body(
                403,
                &json!({"detail": "You do not have permission to perform this action."}),
            )),
            path => {
                let valid = self.state.lock().valid_token.clone();
                match (request.bearer_token(), valid) {
                    (Some(sent), Some(valid)) if sent == valid => Ok(ApiResponse::json_body(
                        200,
                        &json!({"path": path, "token": sent}),
                    )),
                    _ => Ok(ApiResponse::json_body(
                        401,
                        &json!({"detail": "Authentication credentials were not provided."}),
                    )),
                }
            }
        }
    }
}

/// Router double that records redirects.
#[derive(Debug)]
pub struct RecordingNavigator {
    route: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(route: &str) -> Self {
        Self {
            route: Mutex::new(route.to_string()),
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_route(&self) -> String {
        self.route.lock().clone()
    }

    fn redirect(&self, route: &str) {
        *self.route.lock() = route.to_string();
        self.redirects.lock().push(route.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
    Expiring(Duration),
}

/// Notifier double that records every notice.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn expiring_count(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::Expiring(_)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notices.lock().push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.lock().push(Notice::Error(message.to_string()));
    }

    fn session_expiring(&self, remaining: Duration) {
        self.notices.lock().push(Notice::Expiring(remaining));
    }
}

/// A pipeline wired to doubles.
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new(mode: RefreshMode, route: &str) -> Self {
        Self::with_settings(mode, route, PipelineSettings::default())
    }

    pub fn with_settings(mode: RefreshMode, route: &str, settings: PipelineSettings) -> Self {
        let transport = Arc::new(ScriptedTransport::new(mode));
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemorySessionStore::new(clock.clone()));
        let navigator = Arc::new(RecordingNavigator::at(route));
        let notifier = Arc::new(RecordingNotifier::default());

        let pipeline = Pipeline::new(
            settings,
            PipelinePorts {
                transport: transport.clone(),
                store: store.clone(),
                navigator: navigator.clone(),
                notifier: notifier.clone(),
                clock: clock.clone(),
            },
        );

        Self {
            transport,
            store,
            navigator,
            notifier,
            clock,
            pipeline,
        }
    }

    /// Stores a session whose access token the backend no longer accepts.
    pub async fn signed_in(&self) {
        self.store
            .begin_session(
                UserProfile::new("1", "ada@example.com"),
                TokenBundle::new(INITIAL_ACCESS, Some(INITIAL_REFRESH.to_string()), 3600),
            )
            .await
            .unwrap();
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.pipeline.coordinator
    }
}

/// Waits until `n` requests are queued behind the in-flight refresh.
pub async fn wait_for_pending(coordinator: &RefreshCoordinator, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while coordinator.pending() < n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("requests never queued behind the refresh");
}

/// Waits until the transport has seen `n` refresh calls.
pub async fn wait_for_refresh_call(transport: &ScriptedTransport, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while transport.refresh_requests() < n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("refresh call never reached the transport");
}
