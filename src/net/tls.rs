//! TLS termination.
//!
//! # Responsibilities
//! - Load certificate chain and private key (PEM)
//! - Fix the cipher policy: TLS 1.2 floor, ECDHE-RSA-AES256-GCM-SHA384
//!   preferred, P-384 over P-256
//! - Gate HTTP/2 over the listener behind its config toggle (via ALPN)
//!
//! # Design Decisions
//! - rustls only negotiates with server-side cipher preference
//! - rustls offers no CBC suites and no P-521 group; the policy keeps the
//!   supported remainder in preference order

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use rustls::crypto::ring;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;

use crate::config::TlsConfig;

/// Error type for TLS setup.
#[derive(Debug)]
pub enum TlsError {
    /// Certificate or key file unreadable.
    Io(std::io::Error),
    /// No private key found in the key file.
    MissingKey(String),
    /// rustls rejected the configuration or key material.
    Config(rustls::Error),
}

impl std::fmt::Display for TlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsError::Io(e) => write!(f, "TLS material unreadable: {}", e),
            TlsError::MissingKey(path) => write!(f, "No private key found in {}", path),
            TlsError::Config(e) => write!(f, "TLS configuration rejected: {}", e),
        }
    }
}

impl std::error::Error for TlsError {}

impl From<std::io::Error> for TlsError {
    fn from(e: std::io::Error) -> Self {
        TlsError::Io(e)
    }
}

impl From<rustls::Error> for TlsError {
    fn from(e: rustls::Error) -> Self {
        TlsError::Config(e)
    }
}

/// Build the listener's rustls configuration from the TLS section.
pub fn server_config(tls: &TlsConfig, http2_enabled: bool) -> Result<ServerConfig, TlsError> {
    let certs = load_certs(&tls.cert)?;
    let key = load_key(&tls.key)?;

    let provider = CryptoProvider {
        cipher_suites: vec![
            // TLS 1.2, in preference order.
            ring::cipher_suite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            ring::cipher_suite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            // TLS 1.3 suites so connections above the floor still negotiate.
            ring::cipher_suite::TLS13_AES_256_GCM_SHA384,
            ring::cipher_suite::TLS13_AES_128_GCM_SHA256,
            ring::cipher_suite::TLS13_CHACHA20_POLY1305_SHA256,
        ],
        kx_groups: vec![
            ring::kx_group::SECP384R1,
            ring::kx_group::SECP256R1,
            ring::kx_group::X25519,
        ],
        ..ring::default_provider()
    };

    let mut config = ServerConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    config.alpn_protocols = if http2_enabled {
        vec![b"h2".to_vec(), b"http/1.1".to_vec()]
    } else {
        vec![b"http/1.1".to_vec()]
    };

    Ok(config)
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    Ok(certs)
}

fn load_key(path: &str) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| TlsError::MissingKey(path.to_string()))
}
