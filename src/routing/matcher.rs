//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes per endpoint, in configuration order
//! - Look up the matching route for a (method, path) pair
//! - Report whether the match requires authentication
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Endpoints scanned in load order; first structural match wins
//! - Per endpoint, unauthenticated patterns are tried before authenticated
//!   ones, so a public route shadows a protected one with the same shape
//! - Explicit `None` rather than a silent default route

use std::collections::HashMap;

use axum::http::Method;

use crate::config::schema::EndpointConfig;
use crate::routing::pattern::{PathPattern, PatternError};

/// A compiled (method, pattern, auth) tuple.
#[derive(Debug, Clone)]
struct CompiledRoute {
    method: Method,
    pattern: PathPattern,
}

#[derive(Debug, Clone)]
struct CompiledEndpoint {
    id: String,
    unauthenticated: Vec<CompiledRoute>,
    authenticated: Vec<CompiledRoute>,
}

/// The outcome of a successful route match. Created per request.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Identifier of the endpoint that owns the matched route.
    pub endpoint_id: String,
    /// Whether the match came from the authenticated pattern set.
    pub auth_required: bool,
    /// The literal pattern that matched, as configured.
    pub pattern: String,
    /// Captured path parameters, keyed by placeholder name.
    pub params: HashMap<String, String>,
}

/// Immutable route table compiled from endpoint configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    endpoints: Vec<CompiledEndpoint>,
}

impl RouteTable {
    /// Compile the route table from endpoint configs, preserving order.
    pub fn from_config(endpoints: &[EndpointConfig]) -> Result<Self, PatternError> {
        let mut compiled = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let mut unauthenticated = Vec::new();
            let mut authenticated = Vec::new();
            for route in &endpoint.routes {
                let method = route
                    .method
                    .parse::<Method>()
                    // Validation rejects bad methods before compilation.
                    .unwrap_or(Method::GET);
                let entry = CompiledRoute {
                    method,
                    pattern: PathPattern::parse(&route.pattern)?,
                };
                if route.auth_required {
                    authenticated.push(entry);
                } else {
                    unauthenticated.push(entry);
                }
            }
            compiled.push(CompiledEndpoint {
                id: endpoint.id.clone(),
                unauthenticated,
                authenticated,
            });
        }
        Ok(Self {
            endpoints: compiled,
        })
    }

    /// Match a (method, path) pair. The path must already be query-stripped.
    ///
    /// Pure function of the compiled table and its input; `None` means no
    /// configured route matches.
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        for endpoint in &self.endpoints {
            for (routes, auth_required) in [
                (&endpoint.unauthenticated, false),
                (&endpoint.authenticated, true),
            ] {
                for route in routes {
                    if route.method != *method {
                        continue;
                    }
                    if let Some(params) = route.pattern.matches(path) {
                        return Some(RouteMatch {
                            endpoint_id: endpoint.id.clone(),
                            auth_required,
                            pattern: route.pattern.raw().to_string(),
                            params,
                        });
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn endpoint(id: &str, routes: Vec<(&str, &str, bool)>) -> EndpointConfig {
        let mut e = EndpointConfig::new(id);
        e.routes = routes
            .into_iter()
            .map(|(method, pattern, auth_required)| RouteConfig {
                method: method.into(),
                pattern: pattern.into(),
                auth_required,
            })
            .collect();
        e
    }

    #[test]
    fn matches_method_and_pattern() {
        let table = RouteTable::from_config(&[endpoint(
            "e1",
            vec![("GET", "/v1/users/{id}", false), ("POST", "/v1/users", false)],
        )])
        .unwrap();

        let m = table.match_route(&Method::GET, "/v1/users/42").unwrap();
        assert_eq!(m.endpoint_id, "e1");
        assert_eq!(m.pattern, "/v1/users/{id}");
        assert_eq!(m.params.get("id").map(String::as_str), Some("42"));
        assert!(!m.auth_required);

        assert!(table.match_route(&Method::DELETE, "/v1/users/42").is_none());
        assert!(table.match_route(&Method::GET, "/v2/users/42").is_none());
    }

    #[test]
    fn auth_flag_reflects_pattern_set() {
        let table = RouteTable::from_config(&[endpoint(
            "e1",
            vec![("GET", "/public/{x}", false), ("GET", "/private/{x}", true)],
        )])
        .unwrap();

        assert!(!table.match_route(&Method::GET, "/public/a").unwrap().auth_required);
        assert!(table.match_route(&Method::GET, "/private/a").unwrap().auth_required);
    }

    #[test]
    fn unauthenticated_set_checked_first() {
        // Same shape in both sets: the unauthenticated one must win.
        let table = RouteTable::from_config(&[endpoint(
            "e1",
            vec![("GET", "/dual/{x}", true), ("GET", "/dual/{x}", false)],
        )])
        .unwrap();

        assert!(!table.match_route(&Method::GET, "/dual/a").unwrap().auth_required);
    }

    #[test]
    fn first_endpoint_in_load_order_wins() {
        let table = RouteTable::from_config(&[
            endpoint("e1", vec![("GET", "/shared/{x}", false)]),
            endpoint("e2", vec![("GET", "/shared/{x}", false)]),
        ])
        .unwrap();

        assert_eq!(
            table.match_route(&Method::GET, "/shared/a").unwrap().endpoint_id,
            "e1"
        );
    }

    #[test]
    fn no_match_is_none_not_error() {
        let table = RouteTable::from_config(&[]).unwrap();
        assert!(table.match_route(&Method::GET, "/anything").is_none());
    }
}
