//! Postern binary entry point.
//!
//! Loads configuration, initializes logging, builds the runtime honoring the
//! `server.threads` hint, and serves until graceful shutdown completes.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use postern::config::{load_config, ConfigSnapshot};
use postern::http::HttpServer;
use postern::lifecycle::{signals, ServerState};
use postern::observability;

#[derive(Parser, Debug)]
#[command(name = "postern", about = "Forward-configured reverse HTTP proxy", version)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "POSTERN_CONFIG")]
    config: Option<PathBuf>,

    /// Override server.bind_address (e.g. "0.0.0.0:8080", ":8443").
    #[arg(short, long, env = "POSTERN_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Override logging.level (error, warn, info, debug, trace).
    #[arg(short, long, env = "POSTERN_LOG_LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut snapshot = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                eprintln!("postern: cannot load {}: {}", path.display(), error);
                return ExitCode::FAILURE;
            }
        },
        None => ConfigSnapshot::default(),
    };

    if let Some(bind_address) = cli.bind_address {
        snapshot.server.bind_address = bind_address;
    }
    if let Some(level) = cli.log_level {
        snapshot.logging.level = level;
    }

    // The process-wide TLS provider, required before any rustls use. May
    // already be installed when embedded in tests.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let log_handle = observability::init_logging(&snapshot.logging.level);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config.file = ?cli.config,
        "postern starting"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if snapshot.server.threads > 0 {
        builder.worker_threads(snapshot.server.threads);
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("postern: cannot build runtime: {}", error);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let state = Arc::new(ServerState::new(snapshot, cli.config, log_handle));
        signals::spawn(state.clone());

        let server = HttpServer::new(state.clone());
        match server.run().await {
            Ok(()) => {
                state.shutdown.finished().await;
                tracing::info!("Shutdown complete");
                ExitCode::SUCCESS
            }
            Err(error) => {
                tracing::error!(error = %error, "Server failed");
                ExitCode::FAILURE
            }
        }
    })
}
