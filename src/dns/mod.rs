//! DNS resolution for upstream hosts.
//!
//! # Responsibilities
//! - Resolve upstream hostnames before dispatch
//! - Honor `dns.resolvers` overrides: UDP port 53, round-robin dispatch,
//!   in-process answer caching
//! - Surface failures carrying the resolver list that was consulted, not the
//!   individual server that failed
//!
//! # Design Decisions
//! - Empty resolver list delegates to the OS stub resolver configuration
//! - IP-literal hosts short-circuit without a query
//! - The resolver handle is rebuilt on reload only when `dns.resolvers`
//!   changed, and republished behind an atomic pointer

use std::net::{IpAddr, SocketAddr};

use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveError;
use hickory_resolver::TokioAsyncResolver;
use thiserror::Error;

use crate::config::DnsConfig;

const DNS_PORT: u16 = 53;
const SYSTEM_LABEL: &str = "<system>";

/// Resolution failure, tagged with the resolvers that were in play.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("lookup for {host} failed via {server}: {source}")]
    Lookup {
        host: String,
        server: String,
        #[source]
        source: ResolveError,
    },

    #[error("unable to resolve ip for {host} via {server}")]
    Unresolvable { host: String, server: String },
}

impl DnsError {
    /// The resolver list consulted, joined for operator display.
    pub fn server(&self) -> &str {
        match self {
            DnsError::Lookup { server, .. } | DnsError::Unresolvable { server, .. } => server,
        }
    }
}

/// Hostname resolver for upstream origins.
pub struct Resolver {
    inner: TokioAsyncResolver,
    /// Joined custom nameserver list, or the system label.
    server_label: String,
}

impl Resolver {
    /// Build a resolver from the DNS section of a snapshot.
    pub fn from_config(dns: &DnsConfig) -> Self {
        let nameservers: Vec<IpAddr> = dns
            .resolvers
            .iter()
            .filter_map(|entry| entry.parse().ok())
            .collect();

        if nameservers.is_empty() {
            tracing::info!(resolvers = SYSTEM_LABEL, "DNS resolvers");
            return Self::system();
        }

        tracing::info!(resolvers = ?dns.resolvers, "DNS resolvers");
        Self::custom(&dns.resolvers, &nameservers)
    }

    /// OS stub resolver configuration.
    fn system() -> Self {
        let inner = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Unable to read system resolver configuration, using built-in defaults"
                );
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
            }
        };

        Self {
            inner,
            server_label: SYSTEM_LABEL.to_string(),
        }
    }

    /// Pure in-process resolver over the supplied nameservers: UDP port 53,
    /// rotated round-robin, answers cached per (name, type).
    fn custom(labels: &[String], nameservers: &[IpAddr]) -> Self {
        let mut config = ResolverConfig::new();
        for ip in nameservers {
            config.add_name_server(NameServerConfig::new(
                SocketAddr::new(*ip, DNS_PORT),
                Protocol::Udp,
            ));
        }

        let mut opts = ResolverOpts::default();
        opts.rotate = true;

        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
            server_label: join_servers(labels),
        }
    }

    /// Resolve a hostname to its address set.
    ///
    /// IP literals resolve to themselves without consulting a nameserver.
    pub async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, DnsError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let lookup = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|source| DnsError::Lookup {
                host: host.to_string(),
                server: self.server_label.clone(),
                source,
            })?;

        let ips: Vec<IpAddr> = lookup.iter().collect();
        if ips.is_empty() {
            return Err(DnsError::Unresolvable {
                host: host.to_string(),
                server: self.server_label.clone(),
            });
        }

        Ok(ips)
    }

    /// The resolver list consulted by this handle, joined for display.
    pub fn server_label(&self) -> &str {
        &self.server_label
    }
}

fn join_servers(labels: &[String]) -> String {
    labels.join(", or ")
}
