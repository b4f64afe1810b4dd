//! SIGHUP-triggered configuration reload.
//!
//! Re-reads the config file, computes the changelog against the current
//! snapshot, and publishes the replacement atomically. In-flight requests
//! keep the pointers they captured at entry; nothing is torn down under
//! them. A decode or validation failure retains the current snapshot in
//! full.

use std::sync::Arc;

use crate::config::{diff_snapshots, load_config};
use crate::dns::Resolver;
use crate::lifecycle::state::ServerState;
use crate::routing::RouteIndex;
use crate::upstream::UpstreamTransport;

/// Reload configuration and publish the new snapshot.
pub fn reload(state: &ServerState) {
    let Some(path) = &state.config_path else {
        tracing::warn!("No configuration file to reload from, keeping current snapshot");
        return;
    };

    let new_snapshot = match load_config(path) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            tracing::error!(
                config.file = %path.display(),
                error = %error,
                "Reload failed, retaining current configuration"
            );
            return;
        }
    };

    let old_snapshot = state.snapshot.load_full();
    let changes = diff_snapshots(&old_snapshot, &new_snapshot);

    // Rebuild dependents off to the side before any pointer moves.
    let routes = RouteIndex::build(&new_snapshot.routes);

    if new_snapshot.network != old_snapshot.network {
        state
            .transport
            .store(Arc::new(UpstreamTransport::from_config(&new_snapshot.network)));
    }
    if new_snapshot.dns != old_snapshot.dns {
        state
            .resolver
            .store(Arc::new(Resolver::from_config(&new_snapshot.dns)));
    }
    if new_snapshot.logging != old_snapshot.logging {
        state.log_handle.set_level(&new_snapshot.logging.level);
    }

    state.routes.store(Arc::new(routes));
    state.snapshot.store(Arc::new(new_snapshot));

    for change in &changes {
        tracing::info!(
            field = %change.path,
            old = %change.old,
            new = %change.new,
            "Configuration changed"
        );
    }
    tracing::info!(changes = changes.len(), "Configuration reloaded");
}
