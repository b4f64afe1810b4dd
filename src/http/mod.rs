//! HTTP listener subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (router: __ping__, __metrics__, catch-all proxy)
//!     → middleware.rs (completion log, counters, latency)
//!     → proxy engine
//!     → response.rs (synthesized error pages on miss/failure)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use server::{HttpServer, ServeError};
