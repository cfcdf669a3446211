//! CLI commands

use std::error::Error;
use std::sync::Arc;

use clap::Subcommand;
use serde_json::Value;
use tether_application::ports::{Clock, SessionStore};
use tether_application::{LoginCredentials, Pipeline, PipelinePorts};
use tether_domain::{ApiRequest, ApiResponse, PipelineSettings, SessionStatus};
use tether_infrastructure::{
    FileSessionStore, MemoryNavigator, ReqwestTransport, SystemClock, TracingNotifier, session_dir,
};
use tokio::sync::watch;
use tracing::info;

type CommandResult = Result<(), Box<dyn Error>>;

#[derive(Subcommand)]
pub enum Command {
    /// Show the stored session
    Status,

    /// Log in and store the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long)]
        password: String,
    },

    /// Revoke the refresh token and remove the stored session
    Logout,

    /// Send an authenticated GET request
    Get {
        /// Path relative to the base URL
        path: String,
    },

    /// Send an authenticated POST request with a JSON body
    Post {
        /// Path relative to the base URL
        path: String,

        /// JSON body
        #[arg(default_value = "{}")]
        body: String,
    },

    /// Refresh the session now
    Extend,

    /// Warn before the session expires until interrupted
    Watch,
}

struct Host {
    pipeline: Pipeline,
    store: Arc<FileSessionStore>,
    clock: Arc<SystemClock>,
    settings: PipelineSettings,
}

impl Host {
    async fn build(settings: PipelineSettings, route: String) -> Result<Self, Box<dyn Error>> {
        let clock = Arc::new(SystemClock::new());
        let store = Arc::new(FileSessionStore::open(session_dir(&settings)?, clock.clone()).await?);
        let transport = Arc::new(ReqwestTransport::new(
            &settings.base_url,
            settings.request_timeout(),
        )?);

        let pipeline = Pipeline::new(
            settings.clone(),
            PipelinePorts {
                transport,
                store: store.clone(),
                navigator: Arc::new(MemoryNavigator::new(route)),
                notifier: Arc::new(TracingNotifier::new()),
                clock: clock.clone(),
            },
        );

        Ok(Self {
            pipeline,
            store,
            clock,
            settings,
        })
    }
}

impl Command {
    pub async fn execute(self, settings: PipelineSettings, route: String) -> CommandResult {
        let host = Host::build(settings, route).await?;

        match self {
            Self::Status => status(&host).await,
            Self::Login { email, password } => {
                let session = host
                    .pipeline
                    .sessions
                    .login(&LoginCredentials { email, password })
                    .await?;
                println!("Logged in as {}", session.user.email);
                Ok(())
            }
            Self::Logout => {
                host.pipeline.sessions.logout().await?;
                println!("Logged out");
                Ok(())
            }
            Self::Get { path } => {
                let response = host.pipeline.client.send(ApiRequest::get(path)).await?;
                print_response(&response);
                Ok(())
            }
            Self::Post { path, body } => {
                let body: Value = serde_json::from_str(&body)?;
                let response = host
                    .pipeline
                    .client
                    .send(ApiRequest::post(path, body))
                    .await?;
                print_response(&response);
                Ok(())
            }
            Self::Extend => {
                host.pipeline.expiry.extend_session().await?;
                status(&host).await
            }
            Self::Watch => watch_expiry(&host).await,
        }
    }
}

async fn status(host: &Host) -> CommandResult {
    let Some(session) = host.store.session().await else {
        println!("Session: {}", SessionStatus::NotAuthenticated.display_message());
        return Ok(());
    };

    let status = session.status(host.clock.now(), host.settings.warning_window());
    println!("User:    {}", session.user.email);
    println!("Session: {}", status.display_message());
    println!("Store:   {}", host.store.dir().display());
    Ok(())
}

async fn watch_expiry(host: &Host) -> CommandResult {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let expiry = Arc::clone(&host.pipeline.expiry);
    let runner = tokio::spawn(async move { expiry.run(shutdown_rx).await });

    info!(
        poll_interval_secs = host.settings.poll_interval_secs,
        "watching session expiry, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c().await?;

    shutdown_tx.send(true)?;
    runner.await?;
    Ok(())
}

fn print_response(response: &ApiResponse) {
    match response.json::<Value>() {
        Ok(json) => match serde_json::to_string_pretty(&json) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{}", response.text()),
        },
        Err(_) => println!("{}", response.text()),
    }
}
