//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, outer timeout).
    pub listener: ListenerConfig,

    /// Endpoint definitions (routes, rewrites, origin ordering).
    pub endpoints: Vec<EndpointConfig>,

    /// Origin server definitions.
    pub origins: Vec<OriginConfig>,

    /// Header names never forwarded in either direction, gateway-wide.
    pub blocked_headers: Vec<String>,

    /// Health probing settings shared by all origin monitors.
    pub health: HealthProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Hard ceiling on total request handling time in seconds.
    /// Per-endpoint timeouts apply beneath this.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Load-balancing policy for an endpoint.
///
/// Resolved once at config load; the hot path never compares strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    #[default]
    RoundRobin,
    Random,
}

/// A single route owned by an endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// HTTP method (e.g., "GET").
    pub method: String,

    /// Path pattern with `{name}` placeholders, one segment each.
    pub pattern: String,

    /// Whether a match on this route requires the authentication callback.
    #[serde(default)]
    pub auth_required: bool,
}

/// A per-method URL rewrite rule. Declaration order is significant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewriteConfig {
    /// HTTP method the rule applies to.
    pub method: String,

    /// Source pattern matched against the inbound path.
    pub source: String,

    /// Target pattern the path is rewritten to.
    pub target: String,
}

/// Endpoint configuration: a logical API surface with routes and origins.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Unique endpoint identifier.
    pub id: String,

    /// Display name for logs and dashboards.
    #[serde(default)]
    pub name: String,

    /// Per-request timeout for forwarding, in milliseconds.
    #[serde(default = "default_endpoint_timeout_ms")]
    pub timeout_ms: u64,

    /// Load-balancing policy across this endpoint's origins.
    #[serde(default)]
    pub policy: BalancePolicy,

    /// Reject HTTP/1.0 requests with 505.
    #[serde(default)]
    pub block_http10: bool,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Log a line per proxied request.
    #[serde(default)]
    pub log_requests: bool,

    /// Capture request/response bodies in logs (debugging only).
    #[serde(default)]
    pub capture_bodies: bool,

    /// Header carrying the serialized auth context to the origin.
    /// When absent, no auth context is forwarded.
    #[serde(default)]
    pub auth_context_header: Option<String>,

    /// Additional blocked headers local to this endpoint.
    #[serde(default)]
    pub blocked_headers: Vec<String>,

    /// Ordered origin identifiers (load-balancing candidate order).
    #[serde(default)]
    pub origins: Vec<String>,

    /// Routes owned by this endpoint.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Rewrite rules owned by this endpoint.
    #[serde(default)]
    pub rewrites: Vec<RewriteConfig>,
}

fn default_endpoint_timeout_ms() -> u64 {
    30_000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl EndpointConfig {
    /// A minimal endpoint with defaults, used by tests and bootstrap code.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            timeout_ms: default_endpoint_timeout_ms(),
            policy: BalancePolicy::RoundRobin,
            block_http10: false,
            max_body_bytes: default_max_body_bytes(),
            log_requests: false,
            capture_bodies: false,
            auth_context_header: None,
            blocked_headers: Vec::new(),
            origins: Vec::new(),
            routes: Vec::new(),
            rewrites: Vec::new(),
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OriginConfig {
    /// Unique origin identifier.
    pub id: String,

    /// Origin hostname or IP.
    pub host: String,

    /// Origin port.
    pub port: u16,

    /// Forward to the origin over TLS.
    #[serde(default)]
    pub tls: bool,

    /// HTTP method used by health probes.
    #[serde(default = "default_health_method")]
    pub health_method: String,

    /// Path probed by the health monitor.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Interval between probes in milliseconds (>= 1000).
    #[serde(default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    /// Consecutive failed probes before marking unhealthy.
    #[serde(default = "default_unhealthy_threshold")]
    pub unhealthy_threshold: u32,

    /// Consecutive successful probes before marking healthy.
    #[serde(default = "default_healthy_threshold")]
    pub healthy_threshold: u32,

    /// Hard ceiling on simultaneous in-flight requests to this origin.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_requests: usize,

    /// Active+pending count at which new requests are refused with 429.
    #[serde(default = "default_rate_limit_threshold")]
    pub rate_limit_threshold: usize,

    /// Log a line per forwarded request.
    #[serde(default)]
    pub log_requests: bool,

    /// Capture bodies in logs (debugging only).
    #[serde(default)]
    pub capture_bodies: bool,
}

fn default_health_method() -> String {
    "GET".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_health_interval_ms() -> u64 {
    10_000
}

fn default_unhealthy_threshold() -> u32 {
    3
}

fn default_healthy_threshold() -> u32 {
    2
}

fn default_max_parallel() -> usize {
    100
}

fn default_rate_limit_threshold() -> usize {
    200
}

impl OriginConfig {
    /// A minimal origin with defaults, used by tests and bootstrap code.
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
            tls: false,
            health_method: default_health_method(),
            health_path: default_health_path(),
            health_interval_ms: default_health_interval_ms(),
            unhealthy_threshold: default_unhealthy_threshold(),
            healthy_threshold: default_healthy_threshold(),
            max_parallel_requests: default_max_parallel(),
            rate_limit_threshold: default_rate_limit_threshold(),
            log_requests: false,
            capture_bodies: false,
        }
    }

    /// URL scheme for forwarding to this origin.
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    /// `host:port` authority, also forced into the outbound Host header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Health probing settings shared by all origin monitors.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthProbeConfig {
    /// Probe timeout in milliseconds, independent of request timeouts.
    pub probe_timeout_ms: u64,

    /// Enable active health probing.
    pub enabled: bool,
}

impl Default for HealthProbeConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2_000,
            enabled: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
