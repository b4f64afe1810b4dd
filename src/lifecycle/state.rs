//! Shared server state.
//!
//! One `ServerState` exists per process. The configuration snapshot, route
//! index, upstream transport, and resolver all live behind atomic pointers:
//! request handlers load them once at entry and run against that capture,
//! while the reload path builds replacements off to the side and swaps them
//! in. Readers never block writers and vice versa.

use std::path::PathBuf;
use std::time::Instant;

use arc_swap::ArcSwap;

use crate::config::ConfigSnapshot;
use crate::dns::Resolver;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::{LogHandle, Metrics};
use crate::proxy::RequestScope;
use crate::routing::RouteIndex;
use crate::upstream::UpstreamTransport;

/// The running lifecycle of the proxy.
pub struct ServerState {
    /// Process start, reported as X-Uptime on the liveness endpoint.
    pub startup_time: Instant,

    /// Where the snapshot came from; `None` disables reload.
    pub config_path: Option<PathBuf>,

    pub snapshot: ArcSwap<ConfigSnapshot>,
    pub routes: ArcSwap<RouteIndex>,
    pub transport: ArcSwap<UpstreamTransport>,
    pub resolver: ArcSwap<Resolver>,

    pub metrics: Metrics,
    pub log_handle: LogHandle,
    pub shutdown: Shutdown,
}

impl ServerState {
    /// Build the full state from a validated snapshot.
    pub fn new(
        snapshot: ConfigSnapshot,
        config_path: Option<PathBuf>,
        log_handle: LogHandle,
    ) -> Self {
        let routes = RouteIndex::build(&snapshot.routes);
        let transport = UpstreamTransport::from_config(&snapshot.network);
        let resolver = Resolver::from_config(&snapshot.dns);

        Self {
            startup_time: Instant::now(),
            config_path,
            snapshot: ArcSwap::from_pointee(snapshot),
            routes: ArcSwap::from_pointee(routes),
            transport: ArcSwap::from_pointee(transport),
            resolver: ArcSwap::from_pointee(resolver),
            metrics: Metrics::new(),
            log_handle,
            shutdown: Shutdown::new(),
        }
    }

    /// Capture the shared pointers one request runs against. Called exactly
    /// once at the start of request handling.
    pub fn request_scope(&self) -> RequestScope {
        let snapshot = self.snapshot.load_full();
        RequestScope {
            tls_enabled: snapshot.server.tls.enabled,
            routes: self.routes.load_full(),
            transport: self.transport.load_full(),
            resolver: self.resolver.load_full(),
            snapshot,
        }
    }
}
