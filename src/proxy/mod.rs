//! The per-request proxy engine.
//!
//! # Data Flow
//! ```text
//! Request
//!     → route lookup (miss: synthesized 404)
//!     → upstream template interpolation + URL parse (fail: 500)
//!     → DNS probe (fail: 500, resolver list attached)
//!     → capture original headers
//!     → forwarded-metadata injection (X-Origin-Host, X-Forwarded-*)
//!     → request header transform
//!     → target rewrite (Host, URI authority/scheme)
//!     → optional chunked-body aggregation
//!     → upstream dispatch (transport errors bubble up)
//!     → response header transform (against captured request headers)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - All snapshot/index/transport pointers are captured once per request; a
//!   reload mid-request is never observed
//! - Header processing completes before any body bytes are forwarded; body
//!   streaming is zero-copy unless aggregation is requested
//! - Transport errors are returned, not synthesized; the surrounding handler
//!   turns them into a 502

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::http::uri::{PathAndQuery, Scheme};
use axum::http::{Method, Request, Response, Uri};
use http_body_util::BodyExt;
use thiserror::Error;

use crate::config::ConfigSnapshot;
use crate::dns::Resolver;
use crate::http::response;
use crate::routing::RouteIndex;
use crate::transform::{interpolate, transform_request, transform_response, HttpContext};
use crate::upstream::UpstreamTransport;

static X_ORIGIN_HOST: HeaderName = HeaderName::from_static("x-origin-host");
static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

const TRACING_ENABLED: &str = "enabled";

/// Errors the engine cannot resolve into a synthesized response.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection, TLS, or I/O failure against the upstream. Surfaced to the
    /// caller so the outer machinery can answer (typically with a 502).
    #[error("upstream dispatch failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

/// The shared handles one request runs against, captured once at entry.
pub struct RequestScope {
    pub snapshot: Arc<ConfigSnapshot>,
    pub routes: Arc<RouteIndex>,
    pub transport: Arc<UpstreamTransport>,
    pub resolver: Arc<Resolver>,
    /// Whether the listener terminates TLS (drives X-Forwarded-Proto).
    pub tls_enabled: bool,
}

/// Proxy one request through its matched route.
pub async fn handle(
    scope: &RequestScope,
    mut request: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let pages = &scope.snapshot.response;

    // 1. Route lookup. A miss never touches the upstream.
    let Some(route) = scope.routes.lookup(request.uri().path()) else {
        tracing::debug!(path = %request.uri().path(), "No route matched");
        return Ok(response::not_found(pages));
    };

    // 2. Upstream template resolution.
    let upstream_raw = interpolate(
        &route.upstream,
        Some(&route),
        &HttpContext::Request {
            headers: request.headers(),
        },
    );
    let upstream: Uri = match upstream_raw.parse() {
        Ok(uri) => uri,
        Err(error) => {
            tracing::error!(
                upstream = %upstream_raw,
                route.name = %route.name,
                error = %error,
                "Upstream URL does not parse"
            );
            return Ok(response::internal_server_error(pages));
        }
    };
    let (Some(origin_host), Some(origin_authority)) =
        (upstream.host(), upstream.authority().cloned())
    else {
        tracing::error!(
            upstream = %upstream_raw,
            route.name = %route.name,
            "Upstream URL has no host"
        );
        return Ok(response::internal_server_error(pages));
    };

    // 3. Verify the origin host is resolvable before dialing.
    match scope.resolver.resolve(origin_host).await {
        Ok(_) => {}
        Err(error) => {
            tracing::error!(
                origin = %upstream_raw,
                route.name = %route.name,
                server = %error.server(),
                error = %error,
                "Upstream host did not resolve"
            );
            return Ok(response::internal_server_error(pages));
        }
    }

    // 4. Keep a copy of the request headers for response rewriting; the
    // transforms below mutate the live map.
    let original_headers = request.headers().clone();

    // 5. Forwarded metadata, append semantics so chained proxies accumulate.
    let origin_host_value = match HeaderValue::from_str(origin_authority.as_str()) {
        Ok(value) => value,
        Err(error) => {
            tracing::error!(
                upstream = %upstream_raw,
                error = %error,
                "Upstream authority is not a legal header value"
            );
            return Ok(response::internal_server_error(pages));
        }
    };
    let request_host = client_host(&request);
    request
        .headers_mut()
        .append(&X_ORIGIN_HOST, origin_host_value.clone());
    if let Ok(value) = HeaderValue::from_str(&request_host) {
        request.headers_mut().append(&X_FORWARDED_HOST, value);
    }
    if !request.headers().contains_key(&X_FORWARDED_PROTO) {
        let proto = if scope.tls_enabled { "https" } else { "http" };
        request
            .headers_mut()
            .append(&X_FORWARDED_PROTO, HeaderValue::from_static(proto));
    }

    // 6. Request transform runs after step 5 so configuration can override
    // the forwarded values.
    transform_request(
        &scope.snapshot.transform.request,
        Some(&route),
        request.headers_mut(),
    );

    // 7. Retarget the request at the origin.
    if let Err(error) = retarget(&mut request, &origin_authority, upstream.scheme_str()) {
        tracing::error!(upstream = %upstream_raw, error = %error, "URI rewrite failed");
        return Ok(response::internal_server_error(pages));
    }
    request.headers_mut().insert(HOST, origin_host_value);

    // 8. Optional chunked-body aggregation.
    if route.aggregate_chunks
        && (request.method() == Method::POST || request.method() == Method::PUT)
    {
        request = match aggregate_body(request).await {
            Ok(aggregated) => aggregated,
            Err(error) => {
                // The client body stream broke mid-read; the request cannot
                // be replayed against the origin.
                tracing::error!(error = %error, "Unable to aggregate request body");
                return Ok(response::internal_server_error(pages));
            }
        };
    }

    // 9. Dispatch. Transport errors bubble up unchanged.
    tracing::debug!(host = %origin_authority, origin = %upstream_raw, "Proxying request");
    trace_request(&request, &original_headers);

    let mut upstream_response = match scope.transport.dispatch(request).await {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(error = %error, "Upstream responded with error");
            return Err(ProxyError::Transport(error));
        }
    };

    trace_response(&upstream_response, &original_headers);

    // 10. Response transform, interpolated against the headers captured in
    // step 4 since the live request map was rewritten for the origin.
    transform_response(
        &scope.snapshot.transform.response,
        Some(&route),
        upstream_response.headers_mut(),
        &original_headers,
    );

    Ok(upstream_response)
}

/// The host the client addressed, for X-Forwarded-Host.
fn client_host(request: &Request<Body>) -> String {
    if let Some(host) = request.headers().get(HOST).and_then(|v| v.to_str().ok()) {
        return host.to_string();
    }
    request
        .uri()
        .authority()
        .map(|authority| authority.to_string())
        .unwrap_or_default()
}

/// Point the request URI at the origin, preserving path and query.
fn retarget(
    request: &mut Request<Body>,
    authority: &axum::http::uri::Authority,
    scheme: Option<&str>,
) -> Result<(), axum::http::Error> {
    let mut parts = request.uri().clone().into_parts();
    // https only when the upstream scheme is exactly https.
    parts.scheme = Some(if scheme == Some("https") {
        Scheme::HTTPS
    } else {
        Scheme::HTTP
    });
    parts.authority = Some(authority.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    *request.uri_mut() = Uri::from_parts(parts)?;
    Ok(())
}

/// Read the whole request body and rebuild the request with a known length,
/// dropping any chunked transfer coding.
async fn aggregate_body(request: Request<Body>) -> Result<Request<Body>, axum::Error> {
    let (mut parts, body) = request.into_parts();
    let bytes = body.collect().await?.to_bytes();

    parts.headers.remove(TRANSFER_ENCODING);
    parts
        .headers
        .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

fn header_flag(headers: &axum::http::HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == TRACING_ENABLED)
        .unwrap_or(false)
}

/// Dump the outbound request head when the client asked for it.
fn trace_request(request: &Request<Body>, original: &axum::http::HeaderMap) {
    let body_tracing = header_flag(original, "x-trace-request-body");
    if body_tracing || header_flag(original, "x-trace-request-headers") {
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            headers = ?request.headers(),
            body.tracing = body_tracing,
            "Request trace"
        );
    }
}

/// Dump the response head when the client asked for it.
fn trace_response(response: &Response<Body>, original: &axum::http::HeaderMap) {
    let body_tracing = header_flag(original, "x-trace-response-body");
    if body_tracing || header_flag(original, "x-trace-response-headers") {
        tracing::debug!(
            status = %response.status(),
            headers = ?response.headers(),
            body.tracing = body_tracing,
            "Response trace"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn aggregate_body_produces_known_length() {
        let stream = futures_stream();
        let request = Request::builder()
            .method(Method::POST)
            .uri("http://backend:80/upload")
            .header(TRANSFER_ENCODING, "chunked")
            .body(stream)
            .unwrap();

        let aggregated = aggregate_body(request).await.unwrap();

        assert!(aggregated.headers().get(TRANSFER_ENCODING).is_none());
        assert_eq!(aggregated.headers().get(CONTENT_LENGTH).unwrap(), "3");

        let body = aggregated.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, b"abc".as_ref());
    }

    /// A body delivered in multiple frames with no known total length.
    fn futures_stream() -> Body {
        let chunks: Vec<Result<_, std::io::Error>> = vec![Ok("a"), Ok("b"), Ok("c")];
        Body::from_stream(futures_util::stream::iter(chunks))
    }

    #[test]
    fn retarget_rewrites_authority_and_scheme() {
        let mut request = Request::builder()
            .uri("/v1/items?page=2")
            .body(Body::empty())
            .unwrap();
        let authority: axum::http::uri::Authority = "backend:80".parse().unwrap();

        retarget(&mut request, &authority, Some("http")).unwrap();

        assert_eq!(
            request.uri().to_string(),
            "http://backend:80/v1/items?page=2"
        );
    }

    #[test]
    fn retarget_only_exact_https_upgrades_scheme() {
        let authority: axum::http::uri::Authority = "backend:443".parse().unwrap();

        let mut request = Request::builder().uri("/a").body(Body::empty()).unwrap();
        retarget(&mut request, &authority, Some("https")).unwrap();
        assert_eq!(request.uri().scheme_str(), Some("https"));

        let mut request = Request::builder().uri("/a").body(Body::empty()).unwrap();
        retarget(&mut request, &authority, Some("gopher")).unwrap();
        assert_eq!(request.uri().scheme_str(), Some("http"));
    }

    #[test]
    fn client_host_prefers_host_header() {
        let request = Request::builder()
            .uri("http://authority.example/")
            .header(HOST, "edge")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_host(&request), "edge");
    }
}
