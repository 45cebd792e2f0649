//! Supervised HTTP server.
//!
//! ```text
//!                 ┌──────────────────── Supervisor ────────────────────┐
//!   SIGINT/TERM ─►│ signals ──cancel──┐                                │
//!                 │                   ▼                                │
//!                 │            CancellationToken ──► http-drain        │
//!                 │                   ▲               │ stop accepting │
//!   clients ─────►│ http-listener ────┘ (on fault)    ▼ drain ≤ grace  │
//!                 └────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use graceful_server::config::{load_config, validate_config, ServerConfig};
use graceful_server::lifecycle::startup;
use graceful_server::observability::{logging, metrics};
use graceful_server::users::MemoryStore;

#[derive(Parser)]
#[command(name = "graceful-server")]
#[command(about = "HTTP server with coordinated, timeout-bounded shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override shutdown.grace_secs.
    #[arg(long)]
    grace_secs: Option<u64>,
}

impl Cli {
    fn load(&self) -> Result<ServerConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path).map_err(|e| e.to_string())?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(grace) = self.grace_secs {
            config.shutdown.grace_secs = grace;
        }

        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!("graceful-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        read_timeout_secs = config.timeouts.read_secs,
        write_timeout_secs = config.timeouts.write_secs,
        grace_secs = config.shutdown.grace_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(MemoryStore::with_users(config.users.clone()));
    tracing::info!(users = store.len(), "User store ready");

    match startup::run(&config, store, CancellationToken::new()).await {
        Ok(()) => {
            tracing::info!("gracefully shut down server");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(task = %e.task, error = %e.source, "server stopped with error");
            ExitCode::FAILURE
        }
    }
}
