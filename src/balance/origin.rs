//! Origin runtime state.
//!
//! # Responsibilities
//! - Track health state (Unknown/Healthy/Unhealthy) per origin
//! - Track active/pending/outcome counters with atomics
//! - Enforce the per-origin concurrency ceiling via a semaphore
//! - Fast-reject admission when the rate-limit threshold is reached
//!
//! # Design Decisions
//! - Health flag is a single atomic written only by the health monitor and
//!   read without locking by selection; stale reads are bounded by the
//!   probe interval
//! - Counters are lock-free; the semaphore is the only blocking resource
//! - Permit release is tied to an RAII guard so every exit path frees it

use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::schema::OriginConfig;

/// Health state, driven by consecutive probe outcomes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Why admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    /// Active + pending reached the rate-limit threshold; no permit touched.
    RateLimited,
    /// Waited for a concurrency permit until the request timeout expired.
    Saturated,
}

/// Runtime state for one origin. One instance per configured origin,
/// created at config load and discarded on reload.
#[derive(Debug)]
pub struct OriginState {
    /// Origin identifier.
    pub id: String,
    /// `host:port` of the origin.
    pub authority: String,
    /// Scheme for forwarding ("http" or "https").
    pub scheme: &'static str,

    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,

    active: AtomicUsize,
    pending: AtomicUsize,
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,

    limiter: Arc<Semaphore>,
    rate_limit_threshold: usize,
    max_parallel: usize,
}

impl OriginState {
    /// Build runtime state from an origin's configuration.
    pub fn new(config: &OriginConfig) -> Self {
        Self {
            id: config.id.clone(),
            authority: config.authority(),
            scheme: config.scheme(),
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            active: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            limiter: Arc::new(Semaphore::new(config.max_parallel_requests)),
            rate_limit_threshold: config.rate_limit_threshold,
            max_parallel: config.max_parallel_requests,
        }
    }

    /// Current health state.
    pub fn health(&self) -> HealthState {
        self.state.load(Ordering::Relaxed).into()
    }

    /// Eligible for selection: Healthy, or Unknown (not yet probed).
    pub fn is_eligible(&self) -> bool {
        self.state.load(Ordering::Relaxed) != HealthState::Unhealthy as u8
    }

    /// Number of requests currently forwarded to this origin.
    pub fn active_requests(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Number of requests waiting on a concurrency permit.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Configured concurrency ceiling.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Lifetime totals: (total, success, failure).
    pub fn totals(&self) -> (u64, u64, u64) {
        (
            self.total.load(Ordering::Relaxed),
            self.success.load(Ordering::Relaxed),
            self.failure.load(Ordering::Relaxed),
        )
    }

    // --- Health transitions (called only by the health monitor) ---

    /// Record a successful probe. Returns the new state if a transition
    /// happened in this cycle.
    pub fn record_probe_success(&self, healthy_threshold: u32) -> Option<HealthState> {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Healthy as u8 {
            return None;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            // A recovering origin starts with a clean pending ledger.
            self.pending.store(0, Ordering::Relaxed);
            return Some(HealthState::Healthy);
        }
        None
    }

    /// Record a failed probe. Returns the new state if a transition
    /// happened in this cycle.
    pub fn record_probe_failure(&self, unhealthy_threshold: u32) -> Option<HealthState> {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Unhealthy as u8 {
            return None;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return Some(HealthState::Unhealthy);
        }
        None
    }

    // --- Admission control ---

    /// Admit a request for forwarding, or refuse it.
    ///
    /// Requests at or above the rate-limit threshold are refused
    /// immediately without touching the semaphore. Admitted requests wait
    /// for a concurrency permit, bounded by `timeout` (the endpoint's
    /// request timeout), never indefinitely.
    pub async fn admit(
        self: &Arc<Self>,
        timeout: Duration,
    ) -> Result<OriginPermit, AdmissionError> {
        let in_flight =
            self.active.load(Ordering::Relaxed) + self.pending.load(Ordering::Relaxed);
        if in_flight >= self.rate_limit_threshold {
            return Err(AdmissionError::RateLimited);
        }

        self.pending.fetch_add(1, Ordering::Relaxed);
        let acquired =
            tokio::time::timeout(timeout, self.limiter.clone().acquire_owned()).await;
        // A health recovery may have cleared the pending ledger while this
        // waiter was queued; never decrement below zero.
        let _ = self
            .pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| {
                Some(p.saturating_sub(1))
            });

        match acquired {
            Ok(Ok(permit)) => {
                self.active.fetch_add(1, Ordering::Relaxed);
                Ok(OriginPermit {
                    origin: self.clone(),
                    _permit: permit,
                })
            }
            // The semaphore lives as long as the state; it is never closed.
            Ok(Err(_)) => Err(AdmissionError::Saturated),
            Err(_) => Err(AdmissionError::Saturated),
        }
    }

    /// Record the outcome of a forwarded request.
    pub fn record_outcome(&self, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// RAII guard for an admitted request.
///
/// Dropping it decrements the active count and returns the concurrency
/// permit, on every exit path including cancellation.
#[derive(Debug)]
pub struct OriginPermit {
    origin: Arc<OriginState>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for OriginPermit {
    type Target = OriginState;
    fn deref(&self) -> &Self::Target {
        &self.origin
    }
}

impl Drop for OriginPermit {
    fn drop(&mut self) {
        self.origin.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(max_parallel: usize, rate_limit: usize) -> Arc<OriginState> {
        let mut config = OriginConfig::new("o1", "127.0.0.1", 9000);
        config.max_parallel_requests = max_parallel;
        config.rate_limit_threshold = rate_limit;
        Arc::new(OriginState::new(&config))
    }

    #[test]
    fn unhealthy_after_threshold_failures() {
        let o = origin(4, 8);
        assert_eq!(o.record_probe_failure(3), None);
        assert_eq!(o.record_probe_failure(3), None);
        assert_eq!(o.record_probe_failure(3), Some(HealthState::Unhealthy));
        assert!(!o.is_eligible());
        // idempotent once unhealthy
        assert_eq!(o.record_probe_failure(3), None);
    }

    #[test]
    fn healthy_after_threshold_successes() {
        let o = origin(4, 8);
        for _ in 0..3 {
            o.record_probe_failure(3);
        }
        assert_eq!(o.health(), HealthState::Unhealthy);

        assert_eq!(o.record_probe_success(2), None);
        assert_eq!(o.record_probe_success(2), Some(HealthState::Healthy));
        assert!(o.is_eligible());
    }

    #[test]
    fn success_resets_failure_streak() {
        let o = origin(4, 8);
        o.record_probe_failure(3);
        o.record_probe_failure(3);
        o.record_probe_success(1);
        // streak broken, two more failures are not enough
        assert_eq!(o.record_probe_failure(3), None);
        assert_eq!(o.record_probe_failure(3), None);
        assert_eq!(o.record_probe_failure(3), Some(HealthState::Unhealthy));
    }

    #[test]
    fn unknown_state_is_eligible() {
        let o = origin(4, 8);
        assert_eq!(o.health(), HealthState::Unknown);
        assert!(o.is_eligible());
    }

    #[tokio::test]
    async fn admission_respects_rate_limit_threshold() {
        let o = origin(4, 2);
        let p1 = o.admit(Duration::from_millis(100)).await.unwrap();
        let _p2 = o.admit(Duration::from_millis(100)).await.unwrap();
        // active(2) >= threshold(2): refuse without waiting
        let err = o.admit(Duration::from_millis(100)).await.unwrap_err();
        assert_eq!(err, AdmissionError::RateLimited);

        drop(p1);
        assert!(o.admit(Duration::from_millis(100)).await.is_ok());
    }

    #[tokio::test]
    async fn excess_requests_wait_for_a_permit() {
        let o = origin(1, 10);
        let p1 = o.admit(Duration::from_millis(500)).await.unwrap();

        let o2 = o.clone();
        let waiter =
            tokio::spawn(async move { o2.admit(Duration::from_millis(500)).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(o.pending_requests(), 1);

        drop(p1);
        let p2 = waiter.await.unwrap().unwrap();
        assert_eq!(o.active_requests(), 1);
        drop(p2);
        assert_eq!(o.active_requests(), 0);
    }

    #[tokio::test]
    async fn recovery_reset_leaves_queued_waiters_consistent() {
        let o = origin(1, 10);
        let held = o.admit(Duration::from_millis(500)).await.unwrap();

        let o2 = o.clone();
        let waiter =
            tokio::spawn(async move { o2.admit(Duration::from_millis(500)).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(o.pending_requests(), 1);

        // the Healthy transition clears the pending ledger under the waiter
        o.record_probe_failure(1);
        assert_eq!(o.record_probe_success(1), Some(HealthState::Healthy));
        assert_eq!(o.pending_requests(), 0);

        drop(held);
        let p = waiter.await.unwrap().unwrap();
        drop(p);

        // the waiter's own bookkeeping must not underflow the counter
        assert_eq!(o.pending_requests(), 0);
        assert_eq!(o.active_requests(), 0);
        // admission keeps working afterwards
        assert!(o.admit(Duration::from_millis(100)).await.is_ok());
    }

    #[tokio::test]
    async fn permit_wait_is_bounded_by_timeout() {
        let o = origin(1, 10);
        let _held = o.admit(Duration::from_millis(50)).await.unwrap();
        let err = o.admit(Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err, AdmissionError::Saturated);
        assert_eq!(o.pending_requests(), 0);
    }

    #[test]
    fn outcome_counters() {
        let o = origin(4, 8);
        o.record_outcome(true);
        o.record_outcome(true);
        o.record_outcome(false);
        assert_eq!(o.totals(), (3, 2, 1));
    }
}
