//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ConfigSnapshot (validated, immutable)
//!     → published behind an atomic pointer
//!
//! On SIGHUP:
//!     loader.rs loads new snapshot
//!     → validation.rs validates
//!     → diff.rs computes the changelog
//!     → atomic swap of Arc<ConfigSnapshot>
//!     → subsystems observe new snapshot
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable once decoded; changes require a full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A failed reload retains the current snapshot; nothing partially applies

pub mod diff;
pub mod loader;
pub mod schema;
pub mod validation;

pub use diff::{diff_snapshots, Change};
pub use loader::{load_config, ConfigError};
pub use schema::{
    ConfigSnapshot, DnsConfig, ErrorPage, HeaderTransformConfig, LoggingConfig, NetworkConfig,
    ResponseConfig, RouteConfig, ServerConfig, TimeoutsConfig, TlsConfig, TransformConfig,
};
