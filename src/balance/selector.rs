//! Origin selection policies.
//!
//! # Responsibilities
//! - Select one eligible origin for an endpoint per request
//! - Apply round-robin or random policy over the configured origin order
//!
//! # Design Decisions
//! - Policy is a closed enum resolved at config load; no string dispatch
//!   on the hot path and no unknown policy at selection time
//! - Only origins not marked Unhealthy are eligible; if none are,
//!   selection yields None and the pipeline maps it to 502
//! - Round-robin advances the shared cursor by exactly one per call;
//!   the scan past unhealthy origins does not disturb the rotation

use std::sync::Arc;

use rand::Rng;

use crate::balance::endpoint::EndpointState;
use crate::balance::origin::OriginState;
use crate::config::schema::BalancePolicy;

/// Select an origin from the endpoint's ordered candidate list.
///
/// Returns `None` when no origin in the list is eligible.
pub fn select_origin(
    policy: BalancePolicy,
    endpoint: &EndpointState,
    origins: &[Arc<OriginState>],
) -> Option<Arc<OriginState>> {
    if origins.is_empty() {
        return None;
    }

    let start = match policy {
        BalancePolicy::RoundRobin => endpoint.next_index(origins.len()),
        BalancePolicy::Random => rand::thread_rng().gen_range(0..origins.len()),
    };

    for offset in 0..origins.len() {
        let candidate = &origins[(start + offset) % origins.len()];
        if candidate.is_eligible() {
            endpoint.note_selected(&candidate.id);
            return Some(candidate.clone());
        }
    }

    tracing::debug!(
        endpoint = %endpoint.id,
        candidates = origins.len(),
        "No eligible origin in candidate list"
    );
    None
}
