//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters + latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → /__metrics__ (JSON snapshot of the registry)
//! ```
//!
//! # Design Decisions
//! - Counter updates are atomic increments, shared by all handlers
//! - The log level is reloadable; everything else about the subscriber is
//!   fixed at startup

pub mod logging;
pub mod metrics;

pub use logging::{init as init_logging, LogHandle};
pub use metrics::Metrics;
