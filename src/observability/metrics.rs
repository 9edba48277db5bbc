//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, rate limiting, health)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, origin, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_rate_limited_total` (counter): admission refusals by endpoint
//! - `gateway_origin_healthy` (gauge): 1=eligible, 0=unhealthy
//!
//! # Design Decisions
//! - Low-overhead updates (atomic operations in the metrics registry)
//! - Recording never fails the request path; exporter errors are logged

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own bind address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request, on every exit path of the pipeline.
pub fn record_request(endpoint: &str, origin: &str, status: u16, start: Instant) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("origin", origin.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record an admission refusal.
pub fn record_rate_limited(endpoint: &str) {
    metrics::counter!("gateway_rate_limited_total", "endpoint" => endpoint.to_string())
        .increment(1);
}

/// Record an origin's health flag after a probe cycle.
pub fn record_origin_health(origin: &str, healthy: bool) {
    metrics::gauge!("gateway_origin_healthy", "origin" => origin.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
