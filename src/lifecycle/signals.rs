//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGTERM, SIGINT, SIGHUP, SIGUSR1, SIGUSR2
//! - Translate signals to lifecycle actions (shutdown, reload)
//!
//! # Design Decisions
//! - One dedicated consumer task dispatches every signal; request handlers
//!   never observe signals directly
//! - SIGHUP reloads configuration without touching in-flight requests
//! - SIGUSR1/SIGUSR2 are reserved: logged and ignored

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};

use crate::lifecycle::reload;
use crate::lifecycle::state::ServerState;

/// Spawn the signal consumer task.
pub fn spawn(state: Arc<ServerState>) {
    tokio::spawn(async move {
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "Unable to install SIGTERM handler");
                return;
            }
        };
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "Unable to install SIGINT handler");
                return;
            }
        };
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "Unable to install SIGHUP handler");
                return;
            }
        };
        let mut user1 = match signal(SignalKind::user_defined1()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "Unable to install SIGUSR1 handler");
                return;
            }
        };
        let mut user2 = match signal(SignalKind::user_defined2()) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(error = %error, "Unable to install SIGUSR2 handler");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = terminate.recv() => handle_shutdown(&state),
                _ = interrupt.recv() => handle_shutdown(&state),
                _ = hangup.recv() => {
                    tracing::info!("Reload signal received");
                    reload::reload(&state);
                }
                _ = user1.recv() => tracing::info!(signal = "SIGUSR1", "Reserved signal ignored"),
                _ = user2.recv() => tracing::info!(signal = "SIGUSR2", "Reserved signal ignored"),
            }
        }
    });
}

fn handle_shutdown(state: &ServerState) {
    let grace = Duration::from_secs(state.snapshot.load().server.shutdown_timeout);
    state.shutdown.begin(grace);
}
