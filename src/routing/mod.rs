//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → index.rs (route lookup against the published index)
//!     → trie.rs (longest-prefix pattern walk)
//!     → Return: matched Route or miss
//!
//! Index construction (startup and reload):
//!     routes config
//!     → normalize patterns (exactly one leading '/')
//!     → insert into a fresh pattern trie
//!     → publish wholesale via atomic pointer swap
//! ```
//!
//! # Design Decisions
//! - The trie is immutable after construction; no per-lookup allocation
//!   beyond the returned Arc clone
//! - Literal segments beat `*` wildcards at equal depth; the longest
//!   matching pattern wins overall
//! - A reload never mutates the live index; readers see old or new in full

pub mod index;
pub mod trie;

pub use index::{normalize_path, Route, RouteIndex};
