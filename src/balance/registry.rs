//! Runtime-state registry.
//!
//! # Responsibilities
//! - Build one OriginState / EndpointState per configured entity
//! - Resolve an endpoint's ordered origin list to runtime states
//!
//! # Design Decisions
//! - The registry is an arena keyed by identifier, built at config load
//!   and discarded wholesale on reload; runtime counters do not survive
//!   a configuration change
//! - Immutable after construction; shared via Arc inside the snapshot

use std::collections::HashMap;
use std::sync::Arc;

use crate::balance::endpoint::EndpointState;
use crate::balance::origin::OriginState;
use crate::config::schema::GatewayConfig;

/// Arena of per-endpoint and per-origin runtime state.
#[derive(Debug, Default)]
pub struct Registry {
    origins: HashMap<String, Arc<OriginState>>,
    endpoints: HashMap<String, Arc<EndpointState>>,
}

impl Registry {
    /// Build fresh runtime state for every configured origin and endpoint.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let origins = config
            .origins
            .iter()
            .map(|origin| (origin.id.clone(), Arc::new(OriginState::new(origin))))
            .collect();
        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| {
                (
                    endpoint.id.clone(),
                    Arc::new(EndpointState::new(endpoint.id.clone())),
                )
            })
            .collect();
        Self { origins, endpoints }
    }

    pub fn origin(&self, id: &str) -> Option<Arc<OriginState>> {
        self.origins.get(id).cloned()
    }

    pub fn endpoint(&self, id: &str) -> Option<Arc<EndpointState>> {
        self.endpoints.get(id).cloned()
    }

    /// Resolve origin identifiers to runtime states, preserving order.
    /// Unknown identifiers are dropped (validation rejects them upfront).
    pub fn origins_for(&self, origin_ids: &[String]) -> Vec<Arc<OriginState>> {
        origin_ids
            .iter()
            .filter_map(|id| self.origins.get(id).cloned())
            .collect()
    }

    /// All origin states, for the health monitor.
    pub fn all_origins(&self) -> Vec<Arc<OriginState>> {
        self.origins.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{EndpointConfig, OriginConfig};

    #[test]
    fn builds_state_per_entity_and_preserves_order() {
        let mut config = GatewayConfig::default();
        config.origins.push(OriginConfig::new("o1", "127.0.0.1", 9001));
        config.origins.push(OriginConfig::new("o2", "127.0.0.1", 9002));
        let mut endpoint = EndpointConfig::new("e1");
        endpoint.origins = vec!["o2".into(), "o1".into()];
        config.endpoints.push(endpoint);

        let registry = Registry::from_config(&config);
        assert!(registry.origin("o1").is_some());
        assert!(registry.endpoint("e1").is_some());
        assert!(registry.origin("missing").is_none());

        let resolved = registry.origins_for(&["o2".into(), "o1".into()]);
        let ids: Vec<_> = resolved.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, ["o2", "o1"]);
    }
}
