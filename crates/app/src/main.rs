//! Tether - Main Entry Point
//!
//! Command-line host for the authenticated request pipeline: wires the
//! reqwest transport, the file-backed session store and the headless UI
//! adapters, then runs one command.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use commands::Command;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Authenticated API client with automatic session refresh")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./tether.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Route the client reports as current when a session ends
    #[arg(long, global = true, default_value = "/")]
    route: String,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = tether_infrastructure::load_settings(cli.config.as_deref())?;
    tracing::debug!(base_url = %settings.base_url, "settings loaded");

    cli.command.execute(settings, cli.route).await
}
