//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse patterns with literal segments and `{name}` placeholders
//! - Match a raw path and capture placeholder values
//! - Expand a pattern from captured parameters (rewrite targets)
//!
//! # Design Decisions
//! - A placeholder matches exactly one path segment, never spans segments
//! - No regex to guarantee O(n) matching
//! - Unresolved placeholders during expansion are carried through literally
//!   rather than dropped, so a misconfigured rewrite is visible on the wire

use std::collections::HashMap;

use thiserror::Error;

/// Error type for pattern parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("empty placeholder name in segment '{0}'")]
    EmptyPlaceholder(String),

    #[error("unterminated placeholder in segment '{0}'")]
    UnterminatedPlaceholder(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern such as `/v1/users/{id}`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let mut segments = Vec::new();
        for part in raw.split('/').skip(1) {
            if part.starts_with('{') {
                if !part.ends_with('}') {
                    return Err(PatternError::UnterminatedPlaceholder(part.to_string()));
                }
                let name = &part[1..part.len() - 1];
                if name.is_empty() {
                    return Err(PatternError::EmptyPlaceholder(part.to_string()));
                }
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written in configuration.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Match a path against this pattern, capturing placeholder values.
    ///
    /// Returns `None` on a structural mismatch. The path must have the same
    /// number of segments as the pattern.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        if !path.starts_with('/') {
            return None;
        }
        let parts: Vec<&str> = path.split('/').skip(1).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) => {
                    if lit != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }

    /// Expand this pattern using captured parameters.
    ///
    /// Placeholders with no binding stay as the literal `{name}` token.
    pub fn expand(&self, params: &HashMap<String, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(lit) => out.push_str(lit),
                Segment::Param(name) => match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_matches_exact_path() {
        let p = PathPattern::parse("/api/users").unwrap();
        assert!(p.matches("/api/users").is_some());
        assert!(p.matches("/api/users/extra").is_none());
        assert!(p.matches("/api").is_none());
    }

    #[test]
    fn placeholder_captures_one_segment() {
        let p = PathPattern::parse("/v1/users/{id}").unwrap();
        let params = p.matches("/v1/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        // a placeholder never spans segments
        assert!(p.matches("/v1/users/42/detail").is_none());
    }

    #[test]
    fn multiple_placeholders() {
        let p = PathPattern::parse("/orgs/{org}/repos/{repo}").unwrap();
        let params = p.matches("/orgs/acme/repos/gw").unwrap();
        assert_eq!(params.get("org").map(String::as_str), Some("acme"));
        assert_eq!(params.get("repo").map(String::as_str), Some("gw"));
    }

    #[test]
    fn expand_substitutes_by_name() {
        let p = PathPattern::parse("/users/{id}").unwrap();
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());
        assert_eq!(p.expand(&params), "/users/42");
    }

    #[test]
    fn expand_keeps_unresolved_placeholder_literal() {
        let p = PathPattern::parse("/users/{id}/{missing}").unwrap();
        let mut params = HashMap::new();
        params.insert("id".to_string(), "42".to_string());
        assert_eq!(p.expand(&params), "/users/42/{missing}");
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!(
            PathPattern::parse("no-slash").unwrap_err(),
            PatternError::MissingLeadingSlash
        );
        assert!(matches!(
            PathPattern::parse("/a/{}").unwrap_err(),
            PatternError::EmptyPlaceholder(_)
        ));
        assert!(matches!(
            PathPattern::parse("/a/{id").unwrap_err(),
            PatternError::UnterminatedPlaceholder(_)
        ));
    }

    #[test]
    fn root_pattern() {
        let p = PathPattern::parse("/").unwrap();
        assert!(p.matches("/").is_some());
        assert!(p.matches("/x").is_none());
    }
}
