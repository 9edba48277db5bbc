//! Origin health subsystem.
//!
//! # States
//! - Unknown: not yet probed; still eligible for traffic
//! - Healthy: origin receives traffic
//! - Unhealthy: origin excluded from load balancing
//!
//! # State Transitions
//! ```text
//! (Unknown|Healthy) → Unhealthy: consecutive failures >= unhealthy_threshold
//! (Unknown|Unhealthy) → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! # Design Decisions
//! - Hysteresis prevents flapping; counters reset on transition
//! - Probes run on their own timers, independent of request traffic
//! - Selection reads the flag without locking; staleness is bounded by
//!   the probe interval

pub mod monitor;

pub use monitor::HealthMonitor;
