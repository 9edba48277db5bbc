//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured log lines, request IDs as fields)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Logging is fire-and-forget and never blocks request handling
//! - The request correlation ID flows to the origin as a header and into
//!   log fields

pub mod metrics;
