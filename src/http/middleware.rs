//! Listener-side middleware.
//!
//! The proxy handler is wrapped (outer → inner) by `log_request` →
//! `record_metrics` → timeout → handler, mirroring the mount order on the
//! router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{CONTENT_LENGTH, HOST, USER_AGENT};
use axum::middleware::Next;
use axum::response::Response;

use crate::lifecycle::ServerState;

/// One completion log line per handled request.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.to_string());
    let host = header_str(&request, HOST);
    let method = request.method().clone();
    let uri = request.uri().to_string();
    let proto = request.version();
    let user_agent = header_str(&request, USER_AGENT);

    let response = next.run(request).await;

    // Streamed responses of unknown length log zero bytes.
    let bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);

    tracing::info!(
        remote.address = remote.as_deref().unwrap_or("-"),
        request.host = %host,
        request.method = %method,
        request.uri = %uri,
        request.proto = ?proto,
        response.status = response.status().as_u16(),
        response.bytes = bytes,
        request.user_agent = %user_agent,
        request.duration = ?start.elapsed(),
        "Request handled"
    );

    response
}

/// Count the request on entry, the response on exit, and the elapsed
/// milliseconds regardless of outcome.
pub async fn record_metrics(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    state.metrics.record_request();
    let start = Instant::now();

    let response = next.run(request).await;

    state
        .metrics
        .record_latency(start.elapsed().as_millis() as u64);
    state.metrics.record_response();
    response
}

fn header_str(request: &Request, name: axum::http::HeaderName) -> String {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
