//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → matcher.rs (route table lookup)
//!     → pattern.rs (structural match, parameter capture)
//!     → Return: RouteMatch or None
//!
//! On forward:
//!     matched path → rewrite.rs (per-method source→target rules)
//!
//! Route Compilation (at startup / reload):
//!     EndpointConfig[]
//!     → Parse patterns, split auth/unauth sets
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in the hot path (segment matching only)
//! - Deterministic: same input always matches the same route
//! - First match wins, endpoints scanned in load order

pub mod matcher;
pub mod pattern;
pub mod rewrite;

pub use matcher::{RouteMatch, RouteTable};
pub use pattern::{PathPattern, PatternError};
pub use rewrite::RewriteEngine;
