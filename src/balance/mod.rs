//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → endpoint identified
//!     → registry.rs (resolve ordered origin runtime states)
//!     → selector.rs (apply policy over eligible origins):
//!         - RoundRobin (shared cursor in endpoint.rs)
//!         - Random (uniform draw, no shared cursor)
//!     → origin.rs (admission: rate-limit gate, then permit)
//!     → Return OriginPermit or refusal
//! ```
//!
//! # Design Decisions
//! - Runtime state is an arena keyed by identifier, rebuilt on reload
//! - Unhealthy origins excluded from selection; Unknown is eligible
//! - One mutex per endpoint cursor, one semaphore per origin; nothing
//!   global spans endpoints or origins

pub mod endpoint;
pub mod origin;
pub mod registry;
pub mod selector;

pub use endpoint::EndpointState;
pub use origin::{AdmissionError, HealthState, OriginPermit, OriginState};
pub use registry::Registry;
pub use selector::select_origin;
