//! Endpoint runtime state.
//!
//! # Responsibilities
//! - Hold the round-robin cursor for one endpoint
//! - Track per-endpoint outcome counters
//! - Remember the last selected origin for observability
//!
//! # Design Decisions
//! - The cursor is the only lock-guarded field; read-and-advance is a
//!   single critical section so concurrent selections never skip or
//!   repeat an index
//! - No lock spans more than one endpoint

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Mutable per-endpoint state, created at config load.
#[derive(Debug)]
pub struct EndpointState {
    /// Endpoint identifier.
    pub id: String,

    cursor: Mutex<usize>,
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    last_selected: Mutex<Option<String>>,
}

impl EndpointState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cursor: Mutex::new(0),
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            last_selected: Mutex::new(None),
        }
    }

    /// Read the current cursor and advance it by one, modulo `len`.
    ///
    /// Linearizable per endpoint: each caller observes a distinct index
    /// and wrap-around resets to 0.
    pub fn next_index(&self, len: usize) -> usize {
        let mut cursor = self.cursor.lock().expect("round-robin cursor poisoned");
        let index = *cursor % len;
        *cursor = (index + 1) % len;
        index
    }

    /// Record which origin was selected, for diagnostics.
    pub fn note_selected(&self, origin_id: &str) {
        let mut last = self.last_selected.lock().expect("last_selected poisoned");
        *last = Some(origin_id.to_string());
    }

    /// The origin chosen by the most recent selection, if any.
    pub fn last_selected(&self) -> Option<String> {
        self.last_selected
            .lock()
            .expect("last_selected poisoned")
            .clone()
    }

    /// Record the outcome of a request handled by this endpoint.
    pub fn record_outcome(&self, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Lifetime totals: (total, success, failure).
    pub fn totals(&self) -> (u64, u64, u64) {
        (
            self.total.load(Ordering::Relaxed),
            self.success.load(Ordering::Relaxed),
            self.failure.load(Ordering::Relaxed),
        )
    }
}
