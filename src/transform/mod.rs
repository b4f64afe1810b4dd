//! Header transform and interpolation subsystem.
//!
//! # Data Flow
//! ```text
//! Template value ("{{route.name}}", "{{req.header.x-id}}", ...)
//!     → interpolate.rs (pure substitution against route + HTTP object)
//!     → headers.rs (ordered insert / override / delete application)
//! ```
//!
//! # Design Decisions
//! - The HTTP object is a sum type (request or response), not a dynamic cast
//! - Interpolation never mutates its inputs; unknown placeholders survive
//!   verbatim
//! - Malformed header names/values skip that single operation, never the
//!   request

pub mod headers;
pub mod interpolate;

pub use headers::{transform_request, transform_response};
pub use interpolate::{interpolate, HttpContext};
