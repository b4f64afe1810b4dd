//! Postern: a forward-configured reverse HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                    POSTERN                       │
//!                    │                                                  │
//!   Client Request   │  ┌──────┐   ┌───────┐   ┌──────────┐            │
//!   ─────────────────┼─▶│ net  │──▶│ http  │──▶│ routing  │            │
//!                    │  │listen│   │router │   │  trie    │            │
//!                    │  └──────┘   └───────┘   └────┬─────┘            │
//!                    │                              │                   │
//!                    │                              ▼                   │
//!                    │   ┌───────────┐       ┌──────────────┐          │
//!                    │   │ transform │◀─────▶│ proxy engine │          │
//!                    │   │ + interp  │       └──────┬───────┘          │
//!                    │   └───────────┘              │                   │
//!   Client Response  │  ┌──────────┐   ┌─────┐   ┌──┴────────┐         │
//!   ◀────────────────┼──│ response │◀──│ dns │◀──│ upstream  │◀────────┼── Origin
//!                    │  │transform │   └─────┘   │ transport │         │
//!                    │  └──────────┘             └───────────┘         │
//!                    │                                                  │
//!                    │  ┌────────────────────────────────────────────┐ │
//!                    │  │            Cross-Cutting Concerns           │ │
//!                    │  │  ┌────────┐ ┌───────────────┐ ┌──────────┐ │ │
//!                    │  │  │ config │ │ observability │ │lifecycle │ │ │
//!                    │  │  │+reload │ │ log + metrics │ │sig/stop  │ │ │
//!                    │  │  └────────┘ └───────────────┘ └──────────┘ │ │
//!                    │  └────────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;

// Request path
pub mod dns;
pub mod proxy;
pub mod transform;
pub mod upstream;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ConfigSnapshot;
pub use http::HttpServer;
pub use lifecycle::{ServerState, Shutdown};
