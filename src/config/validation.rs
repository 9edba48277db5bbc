//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (endpoints reference existing origins)
//! - Validate value ranges (thresholds >= 1, interval >= 1000 ms)
//! - Check route and rewrite patterns parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::Method;

use crate::config::schema::GatewayConfig;
use crate::routing::pattern::PathPattern;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "origins[0].port").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a full configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut origin_ids = HashSet::new();
    for (i, origin) in config.origins.iter().enumerate() {
        let field = |name: &str| format!("origins[{}].{}", i, name);

        if origin.id.is_empty() {
            errors.push(ValidationError {
                field: field("id"),
                message: "identifier must be non-empty".into(),
            });
        } else if !origin_ids.insert(origin.id.clone()) {
            errors.push(ValidationError {
                field: field("id"),
                message: format!("duplicate origin identifier '{}'", origin.id),
            });
        }
        if origin.host.is_empty() {
            errors.push(ValidationError {
                field: field("host"),
                message: "host must be non-empty".into(),
            });
        }
        if origin.health_interval_ms < 1000 {
            errors.push(ValidationError {
                field: field("health_interval_ms"),
                message: "health interval must be at least 1000 ms".into(),
            });
        }
        if origin.unhealthy_threshold < 1 {
            errors.push(ValidationError {
                field: field("unhealthy_threshold"),
                message: "threshold must be at least 1".into(),
            });
        }
        if origin.healthy_threshold < 1 {
            errors.push(ValidationError {
                field: field("healthy_threshold"),
                message: "threshold must be at least 1".into(),
            });
        }
        if origin.max_parallel_requests < 1 {
            errors.push(ValidationError {
                field: field("max_parallel_requests"),
                message: "limit must be at least 1".into(),
            });
        }
        if origin.rate_limit_threshold < 1 {
            errors.push(ValidationError {
                field: field("rate_limit_threshold"),
                message: "threshold must be at least 1".into(),
            });
        }
        if origin.health_method.parse::<Method>().is_err() {
            errors.push(ValidationError {
                field: field("health_method"),
                message: format!("invalid HTTP method '{}'", origin.health_method),
            });
        }
    }

    let mut endpoint_ids = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        let field = |name: &str| format!("endpoints[{}].{}", i, name);

        if endpoint.id.is_empty() {
            errors.push(ValidationError {
                field: field("id"),
                message: "identifier must be non-empty".into(),
            });
        } else if !endpoint_ids.insert(endpoint.id.clone()) {
            errors.push(ValidationError {
                field: field("id"),
                message: format!("duplicate endpoint identifier '{}'", endpoint.id),
            });
        }
        if endpoint.origins.is_empty() {
            errors.push(ValidationError {
                field: field("origins"),
                message: "endpoint must reference at least one origin".into(),
            });
        }
        for origin_id in &endpoint.origins {
            if !origin_ids.contains(origin_id) {
                errors.push(ValidationError {
                    field: field("origins"),
                    message: format!("unknown origin '{}'", origin_id),
                });
            }
        }
        for (j, route) in endpoint.routes.iter().enumerate() {
            if route.method.parse::<Method>().is_err() {
                errors.push(ValidationError {
                    field: format!("endpoints[{}].routes[{}].method", i, j),
                    message: format!("invalid HTTP method '{}'", route.method),
                });
            }
            if let Err(e) = PathPattern::parse(&route.pattern) {
                errors.push(ValidationError {
                    field: format!("endpoints[{}].routes[{}].pattern", i, j),
                    message: e.to_string(),
                });
            }
        }
        for (j, rewrite) in endpoint.rewrites.iter().enumerate() {
            if rewrite.method.parse::<Method>().is_err() {
                errors.push(ValidationError {
                    field: format!("endpoints[{}].rewrites[{}].method", i, j),
                    message: format!("invalid HTTP method '{}'", rewrite.method),
                });
            }
            if let Err(e) = PathPattern::parse(&rewrite.source) {
                errors.push(ValidationError {
                    field: format!("endpoints[{}].rewrites[{}].source", i, j),
                    message: e.to_string(),
                });
            }
            if let Err(e) = PathPattern::parse(&rewrite.target) {
                errors.push(ValidationError {
                    field: format!("endpoints[{}].rewrites[{}].target", i, j),
                    message: e.to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
