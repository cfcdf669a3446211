//! Wiring of the pipeline components around a shared coordinator.

use std::sync::Arc;

use tether_domain::PipelineSettings;

use crate::auth::{
    AuthenticatedClient, RefreshCoordinator, SessionExpiryNotifier, SessionService,
    SessionTerminator,
};
use crate::ports::{Clock, HttpTransport, Navigator, Notifier, SessionStore};

/// Adapters the pipeline is built from.
pub struct PipelinePorts {
    /// Sends requests to the backend.
    pub transport: Arc<dyn HttpTransport>,
    /// Holds the session.
    pub store: Arc<dyn SessionStore>,
    /// Router of the hosting application.
    pub navigator: Arc<dyn Navigator>,
    /// Transient messages and the expiry prompt.
    pub notifier: Arc<dyn Notifier>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// All pipeline components, sharing one coordinator and one store.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Client for authenticated API calls.
    pub client: AuthenticatedClient,
    /// The process-wide refresh coordinator.
    pub coordinator: Arc<RefreshCoordinator>,
    /// Login and logout.
    pub sessions: Arc<SessionService>,
    /// Ends sessions that cannot be renewed.
    pub terminator: Arc<SessionTerminator>,
    /// Pre-expiry warnings and the extend action.
    pub expiry: Arc<SessionExpiryNotifier>,
}

impl Pipeline {
    /// Builds every component from `ports` and `settings`.
    #[must_use]
    pub fn new(settings: PipelineSettings, ports: PipelinePorts) -> Self {
        let settings = Arc::new(settings);
        let PipelinePorts {
            transport,
            store,
            navigator,
            notifier,
            clock,
        } = ports;

        let terminator = Arc::new(SessionTerminator::new(
            Arc::clone(&store),
            navigator,
            Arc::clone(&notifier),
            Arc::clone(&settings),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&terminator),
            Arc::clone(&clock),
            &settings,
        ));
        let client = AuthenticatedClient::new(
            Arc::clone(&transport),
            Arc::clone(&store),
            Arc::clone(&coordinator),
            settings.request_timeout(),
        );
        let sessions = Arc::new(SessionService::new(
            transport,
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&settings),
        ));
        let expiry = Arc::new(SessionExpiryNotifier::new(
            store,
            clock,
            notifier,
            Arc::clone(&coordinator),
            Arc::clone(&terminator),
            &settings,
        ));

        Self {
            client,
            coordinator,
            sessions,
            terminator,
            expiry,
        }
    }
}
