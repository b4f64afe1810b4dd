//! Listener acquisition.
//!
//! # Responsibilities
//! - Normalize the configured bind address
//! - Adopt a single inherited activation socket when the supervisor passed
//!   one; bind otherwise
//! - Fail fatally on activation ambiguity (more than one inherited fd)

use std::net::TcpListener;

use listenfd::ListenFd;

const DEFAULT_BINDING_ADDRESS: &str = "0.0.0.0";
const DEFAULT_BINDING_PORT: u16 = 8080;

/// Error type for listener acquisition.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind the configured address.
    Bind(std::io::Error),
    /// Failed to adopt the inherited socket.
    Activation(std::io::Error),
    /// More than one inherited fd was passed.
    ActivationAmbiguity(usize),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Activation(e) => write!(f, "Failed to adopt activation socket: {}", e),
            ListenerError::ActivationAmbiguity(count) => {
                write!(f, "Unexpected number of socket activation fds: {}", count)
            }
        }
    }
}

impl std::error::Error for ListenerError {}

/// Normalize a configured bind address:
/// `""` → `0.0.0.0:8080`, `":<port>"` → `0.0.0.0:<port>`,
/// `"<host>"` → `<host>:8080`, `"<host>:<port>"` unchanged.
pub fn normalize_bind_address(bind_address: &str) -> String {
    if bind_address.is_empty() {
        format!("{}:{}", DEFAULT_BINDING_ADDRESS, DEFAULT_BINDING_PORT)
    } else if bind_address.starts_with(':') {
        format!("{}{}", DEFAULT_BINDING_ADDRESS, bind_address)
    } else if !bind_address.contains(':') {
        format!("{}:{}", bind_address, DEFAULT_BINDING_PORT)
    } else {
        bind_address.to_string()
    }
}

/// Obtain the listener: a single inherited activation socket if the
/// environment carries one, otherwise a fresh bind of `bind_address`
/// (already normalized).
///
/// The listener is set non-blocking, ready for the async server.
pub fn acquire(bind_address: &str) -> Result<TcpListener, ListenerError> {
    let mut fds = ListenFd::from_env();

    let listener = match fds.len() {
        0 => {
            let listener = TcpListener::bind(bind_address).map_err(ListenerError::Bind)?;
            tracing::debug!(bind_address = %bind_address, "Listener bound");
            listener
        }
        1 => {
            let listener = fds
                .take_tcp_listener(0)
                .map_err(ListenerError::Activation)?
                .ok_or_else(|| {
                    ListenerError::Activation(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "activation fd 0 is not a TCP listener",
                    ))
                })?;
            tracing::info!("Adopted inherited activation socket");
            listener
        }
        count => return Err(ListenerError::ActivationAmbiguity(count)),
    };

    listener
        .set_nonblocking(true)
        .map_err(ListenerError::Bind)?;
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_address_gets_defaults() {
        assert_eq!(normalize_bind_address(""), "0.0.0.0:8080");
    }

    #[test]
    fn bare_port_gets_default_host() {
        assert_eq!(normalize_bind_address(":8443"), "0.0.0.0:8443");
    }

    #[test]
    fn bare_host_gets_default_port() {
        assert_eq!(normalize_bind_address("1.2.3.4"), "1.2.3.4:8080");
    }

    #[test]
    fn full_address_is_unchanged() {
        assert_eq!(normalize_bind_address("1.2.3.4:9"), "1.2.3.4:9");
    }

    #[test]
    fn acquire_binds_ephemeral_port() {
        let listener = acquire("127.0.0.1:0").unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn acquire_rejects_unbindable_address() {
        assert!(matches!(
            acquire("256.0.0.1:0"),
            Err(ListenerError::Bind(_))
        ));
    }
}
