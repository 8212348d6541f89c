//! Campus admin dashboard server

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use anyhow::Context;
use campus_admin_core::{Config, LogFormat};
use campus_admin_web::{AppState, build_app};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Upper bound on the time between idle-session sweeps
const SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Command line interface for the dashboard server
#[derive(Parser)]
#[command(
    name = "campus-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admin dashboard for the campus content and admissions backend",
    long_about = "Serves a session-guarded admin dashboard that lists, searches, creates, edits and deletes the records of a campus REST backend."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend base URL (overrides config)
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server (default)
    Serve,

    /// Validate configuration
    Config {
        /// Print the resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

impl Cli {
    /// Apply command line overrides on top of file and environment values
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.backend_url {
            config.backend.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate_all().context("Invalid configuration")?;

    match cli.command {
        Some(Commands::Config { show }) => {
            if show {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Configuration is valid");
            }
            Ok(())
        }
        Some(Commands::Serve) | None => serve(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    campus_admin_core::init_logging(&config.logging)?;

    let addr = config.bind_address();
    let idle_timeout = Duration::from_secs(config.session.idle_timeout_secs);
    info!(backend = %config.backend.base_url, "Starting campus admin dashboard on {addr}");

    let state = AppState::new(config).context("Failed to build backend client")?;
    let sessions = state.sessions.clone();
    let app = build_app(state);

    let sweeper_cancel = CancellationToken::new();
    let sweeper = sessions.spawn_sweeper(
        idle_timeout,
        SWEEP_EVERY.min(idle_timeout),
        sweeper_cancel.clone(),
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper_cancel.cancel();
    if let Err(e) = sweeper.await {
        error!("Idle session sweeper failed: {e}");
    }

    info!(sessions = sessions.len(), "Stopping session guards");
    sessions.shutdown();
    info!("Dashboard stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
