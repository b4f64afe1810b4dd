//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum Router: `/__ping__`, `/__metrics__`, catch-all proxy
//! - Wire up middleware (request log, counters, listener-side timeout)
//! - Acquire the listener (bind or activation socket) and serve, honoring
//!   TLS material when enabled
//! - Return once graceful shutdown completes

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, Response, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::any;
use axum::{BoxError, Router};
use axum_server::tls_rustls::RustlsConfig;
use tower::ServiceBuilder;

use crate::http::middleware::{log_request, record_metrics};
use crate::lifecycle::ServerState;
use crate::net;
use crate::proxy::{self, ProxyError};

/// Error type for serving.
#[derive(Debug)]
pub enum ServeError {
    Listener(net::ListenerError),
    Tls(net::TlsError),
    Io(std::io::Error),
}

impl std::fmt::Display for ServeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServeError::Listener(e) => write!(f, "{}", e),
            ServeError::Tls(e) => write!(f, "{}", e),
            ServeError::Io(e) => write!(f, "Serve failed: {}", e),
        }
    }
}

impl std::error::Error for ServeError {}

impl From<net::ListenerError> for ServeError {
    fn from(e: net::ListenerError) -> Self {
        ServeError::Listener(e)
    }
}

impl From<net::TlsError> for ServeError {
    fn from(e: net::TlsError) -> Self {
        ServeError::Tls(e)
    }
}

async fn handle_request_timeout(_: BoxError) -> StatusCode {
    StatusCode::REQUEST_TIMEOUT
}

/// HTTP server for the proxy.
pub struct HttpServer {
    state: Arc<ServerState>,
}

impl HttpServer {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// Build the router with all mount points and middleware.
    pub fn router(state: Arc<ServerState>) -> Router {
        let snapshot = state.snapshot.load_full();
        // Downstream read/write budgets bound the in-server request as one
        // timeout, keeping them on the listener side.
        let request_budget = Duration::from_secs(
            snapshot.network.timeouts.read + snapshot.network.timeouts.write,
        );

        let proxy_router = Router::new()
            .fallback(proxy_handler)
            // Timeout's service is fallible; expiry must become a response
            // before the router sees it.
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_request_timeout))
                    .timeout(request_budget),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                record_metrics,
            ))
            .layer(middleware::from_fn(log_request))
            .with_state(state.clone());

        let ops_router = Router::new()
            .route("/__ping__", any(ping_handler))
            .route(
                "/__metrics__",
                any(metrics_handler).layer(middleware::from_fn(log_request)),
            )
            .with_state(state);

        ops_router.merge(proxy_router)
    }

    /// Serve until graceful shutdown completes.
    pub async fn run(self) -> Result<(), ServeError> {
        let state = self.state;
        let snapshot = state.snapshot.load_full();

        let app = Self::router(state.clone());
        let service = app.into_make_service_with_connect_info::<SocketAddr>();

        let bind_address = net::normalize_bind_address(&snapshot.server.bind_address);
        let listener = net::acquire(&bind_address)?;
        let handle = state.shutdown.server_handle();

        if snapshot.server.tls.enabled {
            let tls = net::server_config(&snapshot.server.tls, snapshot.server.http2.enabled)?;
            let config = RustlsConfig::from_config(Arc::new(tls));

            tracing::info!(
                bind_address = %bind_address,
                "Postern running, listening for TLS connections"
            );
            axum_server::from_tcp_rustls(listener, config)
                .handle(handle)
                .serve(service)
                .await
                .map_err(ServeError::Io)?;
        } else {
            tracing::info!(
                bind_address = %bind_address,
                "Postern running, listening for non-TLS connections"
            );
            axum_server::from_tcp(listener)
                .handle(handle)
                .serve(service)
                .await
                .map_err(ServeError::Io)?;
        }

        state.shutdown.mark_finished();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness endpoint: 200 with `pong` on GET, empty otherwise.
async fn ping_handler(State(state): State<Arc<ServerState>>, request: Request) -> Response<Body> {
    let uptime = format!("{:?}", state.startup_time.elapsed());
    let body = if request.method() == Method::GET {
        "pong"
    } else {
        ""
    };

    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    if let Ok(value) = HeaderValue::from_str(&uptime) {
        response.headers_mut().insert("x-uptime", value);
    }
    response
}

/// Counter snapshot as a JSON object, expvar-dump style.
async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "application/json; charset=utf-8")],
        state.metrics.snapshot().to_string(),
    )
}

/// Catch-all: the proxy engine, with transport errors surfaced as 502.
async fn proxy_handler(State(state): State<Arc<ServerState>>, request: Request) -> Response<Body> {
    let host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    tracing::debug!(
        request.host = %host,
        request.uri = %request.uri(),
        "Request received"
    );

    let scope = state.request_scope();
    match proxy::handle(&scope, request).await {
        Ok(response) => response,
        Err(ProxyError::Transport(_)) => {
            // Already logged at the failure site.
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
