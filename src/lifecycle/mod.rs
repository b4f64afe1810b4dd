//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → init logging → build ServerState → spawn signal task
//!     → acquire listener → serve
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown.rs (drain within grace, then force close)
//!     SIGHUP → reload.rs (decode → diff → atomic swap)
//!     SIGUSR1/SIGUSR2 → reserved, logged
//! ```
//!
//! # Design Decisions
//! - All shared pointers live in state.rs behind arc-swap cells
//! - Reload never terminates in-flight requests; failed reloads retain the
//!   current snapshot wholesale
//! - Shutdown has a grace period; overruns are force-closed and logged

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use state::ServerState;
