//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (normalize address, adopt activation fd or bind)
//!     → tls.rs (optional rustls configuration)
//!     → Hand off to the HTTP server
//! ```

pub mod listener;
pub mod tls;

pub use listener::{acquire, normalize_bind_address, ListenerError};
pub use tls::{server_config, TlsError};
