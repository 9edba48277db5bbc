//! URL rewrite engine.
//!
//! # Responsibilities
//! - Apply per-endpoint, per-method source→target rewrite rules
//! - Substitute captured placeholders into the target by name
//!
//! # Design Decisions
//! - Rules evaluated in declaration order; first matching source wins
//! - No matching rule means the path passes through unchanged
//! - Placeholder semantics identical to route matching (one segment each)

use axum::http::Method;

use crate::config::schema::RewriteConfig;
use crate::routing::pattern::{PathPattern, PatternError};

#[derive(Debug, Clone)]
struct CompiledRewrite {
    method: Method,
    source: PathPattern,
    target: PathPattern,
}

/// Ordered rewrite rules for one endpoint.
#[derive(Debug, Clone, Default)]
pub struct RewriteEngine {
    rules: Vec<CompiledRewrite>,
}

impl RewriteEngine {
    /// Compile rules preserving declaration order.
    pub fn from_config(rules: &[RewriteConfig]) -> Result<Self, PatternError> {
        let compiled = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRewrite {
                    method: rule.method.parse::<Method>().unwrap_or(Method::GET),
                    source: PathPattern::parse(&rule.source)?,
                    target: PathPattern::parse(&rule.target)?,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { rules: compiled })
    }

    /// Rewrite a matched path for the given method.
    ///
    /// Deterministic: the first rule whose source pattern structurally
    /// matches decides the result; otherwise the path is returned as-is.
    pub fn rewrite(&self, method: &Method, path: &str) -> String {
        for rule in &self.rules {
            if rule.method != *method {
                continue;
            }
            if let Some(params) = rule.source.matches(path) {
                return rule.target.expand(&params);
            }
        }
        path.to_string()
    }
}
