//! Configuration schema definitions.
//!
//! This module defines the complete configuration tree for the proxy.
//! A fully-decoded tree is a snapshot: it is immutable once built, shared
//! behind an atomic pointer, and replaced wholesale on reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration snapshot.
///
/// Every section defaults, so an absent or minimal config file still yields
/// a runnable proxy (which answers 404 for everything until routes exist).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConfigSnapshot {
    /// Listener binding, TLS material, shutdown grace.
    pub server: ServerConfig,

    /// Upstream pool sizing and timeouts.
    pub network: NetworkConfig,

    /// DNS resolver overrides.
    pub dns: DnsConfig,

    /// Synthesized error pages.
    pub response: ResponseConfig,

    /// Header transforms, per direction.
    pub transform: TransformConfig,

    /// Routing table: route name -> route definition.
    pub routes: BTreeMap<String, RouteConfig>,

    /// Logger verbosity.
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address. `""`, `":<port>"` and bare-host forms are normalized
    /// before binding (see `net::listener::normalize_bind_address`).
    pub bind_address: String,

    /// Worker thread hint for the runtime. `0` leaves the runtime default.
    pub threads: usize,

    /// Graceful shutdown grace period in seconds.
    pub shutdown_timeout: u64,

    /// TLS termination settings.
    pub tls: TlsConfig,

    /// HTTP/2 over the listener (TLS only; disabled by default).
    pub http2: Http2Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            threads: 0,
            shutdown_timeout: 30,
            tls: TlsConfig::default(),
            http2: Http2Config::default(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// Terminate TLS on the listener.
    pub enabled: bool,

    /// Path to the certificate chain (PEM).
    pub cert: String,

    /// Path to the private key (PEM).
    pub key: String,
}

/// HTTP/2 listener toggle.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Http2Config {
    pub enabled: bool,
}

/// Upstream pool sizing and network timeouts.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Total idle connections kept across all upstream hosts.
    pub max_idle_connections: usize,

    /// Idle connections kept per upstream host.
    pub max_idle_per_host: usize,

    /// Timeouts, all in seconds.
    pub timeouts: TimeoutsConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_idle_connections: 5000,
            max_idle_per_host: 100,
            timeouts: TimeoutsConfig::default(),
        }
    }
}

/// Network timeouts in seconds.
///
/// `read` and `write` bound downstream I/O and are applied on the listener
/// side; the rest configure the upstream transport.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Upstream dial timeout.
    pub connect: u64,

    /// Listener-side read budget.
    pub read: u64,

    /// Listener-side write budget.
    pub write: u64,

    /// TCP keepalive interval for upstream connections.
    pub keepalive: u64,

    /// Idle upstream connections age out after this.
    pub idle_connection: u64,

    /// Upstream TLS handshake budget.
    pub tls_handshake: u64,

    /// Budget while waiting on a 100-continue exchange.
    pub r#continue: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect: 5,
            read: 10,
            write: 15,
            keepalive: 20,
            idle_connection: 90,
            tls_handshake: 5,
            r#continue: 5,
        }
    }
}

/// DNS resolver overrides.
///
/// When `resolvers` is empty the OS stub resolver is used. Otherwise each
/// entry is an IP literal queried over UDP port 53 with round-robin
/// dispatch.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DnsConfig {
    pub resolvers: Vec<String>,
}

/// Synthesized error pages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub not_found: ErrorPage,
    pub server_error: ErrorPage,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            not_found: ErrorPage {
                code: 404,
                body: DEFAULT_NOT_FOUND_BODY.to_string(),
            },
            server_error: ErrorPage {
                code: 500,
                body: DEFAULT_SERVER_ERROR_BODY.to_string(),
            },
        }
    }
}

/// A configured status code plus static body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ErrorPage {
    pub code: u16,
    pub body: String,
}

impl Default for ErrorPage {
    fn default() -> Self {
        Self {
            code: 500,
            body: String::new(),
        }
    }
}

pub(crate) const DEFAULT_NOT_FOUND_BODY: &str = "\
<html>
  <head>
    <title>404 - Not Found</title>
  </head>
  <body><h1>404 - Not Found</h1></body>
</html>
";

pub(crate) const DEFAULT_SERVER_ERROR_BODY: &str = "\
<html>
  <head>
    <title>500 - Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Please try again later.<p>
  </body>
</html>
";

/// Header transforms for both directions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransformConfig {
    pub request: HeaderTransformConfig,
    pub response: HeaderTransformConfig,
}

/// Ordered header operations for one direction.
///
/// Applied as: all inserts, then all overrides, then all deletes. Insert and
/// override values are templates interpolated per request (see
/// `transform::interpolate`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeaderTransformConfig {
    /// Appended values, keyed by header name.
    pub insert: BTreeMap<String, String>,

    /// Replacement values, keyed by header name.
    pub r#override: BTreeMap<String, String>,

    /// Header names removed outright.
    pub delete: Vec<String>,
}

impl HeaderTransformConfig {
    pub fn is_empty(&self) -> bool {
        self.insert.is_empty() && self.r#override.is_empty() && self.delete.is_empty()
    }
}

/// One routing table entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// Path patterns matched against the request path. Literal segments and
    /// single-segment `*` wildcards.
    pub paths: Vec<String>,

    /// Upstream origin URL template; may contain placeholders resolved per
    /// request.
    pub upstream: String,

    /// Buffer chunked POST/PUT bodies to a known length before forwarding.
    pub aggregate_chunked_requests: bool,
}

/// Logger verbosity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
