//! Upstream transport: the shared HTTP/1.1 client used for all origins.
//!
//! # Responsibilities
//! - Pool upstream connections, capped per host, aging out idle ones
//! - Apply the dial-side timeouts (connect, TCP keepalive)
//! - Speak plaintext or TLS to the origin, HTTP/1.1 only
//!
//! # Design Decisions
//! - One client instance shared by every request; rebuilt on reload only
//!   when the network section changed
//! - No outer HTTP proxy is ever consulted and nothing retries; I/O errors
//!   return to the caller as-is
//! - Downstream read/write budgets live on the listener side, not here

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::{Client, Error as TransportError};
use hyper_util::rt::TokioExecutor;

use crate::config::NetworkConfig;

/// Pooled HTTP/1.1 client for origin dispatch.
pub struct UpstreamTransport {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl UpstreamTransport {
    /// Build the transport from the network section of a snapshot.
    pub fn from_config(network: &NetworkConfig) -> Self {
        let mut connector = HttpConnector::new();
        // The TLS layer decides the scheme; the TCP connector must accept
        // https URIs. Dual-stack (IPv4+IPv6) dialing is the default here.
        connector.enforce_http(false);
        connector.set_connect_timeout(Some(Duration::from_secs(network.timeouts.connect)));
        connector.set_keepalive(Some(Duration::from_secs(network.timeouts.keepalive)));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(network.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(network.timeouts.idle_connection))
            .build(https);

        tracing::debug!(
            max_idle_per_host = network.max_idle_per_host,
            idle_connection_secs = network.timeouts.idle_connection,
            connect_secs = network.timeouts.connect,
            "Upstream transport built"
        );

        Self { client }
    }

    /// Dispatch one request to its origin.
    ///
    /// Any connection, TLS, or I/O failure is returned unchanged; the caller
    /// decides how to surface it.
    pub async fn dispatch(
        &self,
        request: Request<Body>,
    ) -> Result<Response<Body>, TransportError> {
        let response = self.client.request(request).await?;
        Ok(response.map(Body::new))
    }
}
