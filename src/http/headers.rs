//! Header filtering and injection.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers and configured blocked headers, both on the
//!   outbound request and the relayed response
//! - Inject forwarded-client-IP and request-correlation headers
//! - Encode the auth-context header value
//!
//! # Design Decisions
//! - Blocked-name matching is case-insensitive (names are lowercased once
//!   at filter build time)
//! - The same filter applies in both directions, so a blocked header can
//!   never leak through either side of the proxy

use std::collections::HashSet;
use std::net::IpAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use base64::Engine;

/// Forwarded client IP, appended to any inbound value.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Unique per-request correlation identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Hop-by-hop headers never forwarded in either direction. Host is
/// excluded too because the outbound Host is forced to the origin.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Combined global + endpoint blocked-header filter.
#[derive(Debug, Clone, Default)]
pub struct HeaderFilter {
    blocked: HashSet<String>,
}

impl HeaderFilter {
    /// Build from the gateway-wide and endpoint-local blocked lists.
    pub fn new<'a>(lists: impl IntoIterator<Item = &'a str>) -> Self {
        let blocked = lists.into_iter().map(str::to_lowercase).collect();
        Self { blocked }
    }

    /// True when the header must not be forwarded.
    pub fn is_blocked(&self, name: &HeaderName) -> bool {
        let lower = name.as_str(); // HeaderName is always lowercase
        HOP_BY_HOP.contains(&lower) || self.blocked.contains(lower)
    }

    /// Copy of `source` with blocked and hop-by-hop headers removed.
    pub fn filtered(&self, source: &HeaderMap) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(source.len());
        for (name, value) in source {
            if !self.is_blocked(name) {
                out.append(name.clone(), value.clone());
            }
        }
        out
    }
}

/// Append the client IP to the forwarded-for chain.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let existing = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let chain = match existing {
        Some(prior) if !prior.is_empty() => format!("{}, {}", prior, client_ip),
        _ => client_ip.to_string(),
    };

    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

/// Base64-encode a serialized auth context for header transport.
pub fn encode_auth_context(context: &serde_json::Value) -> Option<HeaderValue> {
    let serialized = serde_json::to_vec(context).ok()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(serialized);
    HeaderValue::from_str(&encoded).ok()
}
