//! Active health checking.
//!
//! # Responsibilities
//! - Run one probe loop per origin, on that origin's own interval
//! - Drive the Unknown/Healthy/Unhealthy state machine via consecutive
//!   probe outcomes
//! - Never block request handling; communicate only through the shared
//!   runtime-state flag

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use tokio::sync::broadcast;
use tokio::time;

use crate::balance::origin::OriginState;
use crate::config::schema::{GatewayConfig, OriginConfig};
use crate::observability::metrics;

/// Spawns and stops the probe loops for one configuration snapshot.
///
/// A reload builds a new monitor against the new runtime states and stops
/// the old one; probe loops exit at their next suspension point.
pub struct HealthMonitor {
    client: reqwest::Client,
    probe_timeout: Duration,
    stop_tx: broadcast::Sender<()>,
}

impl HealthMonitor {
    pub fn new(probe_timeout: Duration) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            client: reqwest::Client::new(),
            probe_timeout,
            stop_tx,
        }
    }

    /// Spawn one probe task per configured origin.
    pub fn spawn(
        &self,
        config: &GatewayConfig,
        resolve: impl Fn(&str) -> Option<Arc<OriginState>>,
    ) {
        if !config.health.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        for origin_config in &config.origins {
            let Some(state) = resolve(&origin_config.id) else {
                continue;
            };
            tokio::spawn(watch_origin(
                self.client.clone(),
                origin_config.clone(),
                state,
                self.probe_timeout,
                self.stop_tx.subscribe(),
            ));
        }
    }

    /// Stop every probe loop spawned by this monitor.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn watch_origin(
    client: reqwest::Client,
    config: OriginConfig,
    state: Arc<OriginState>,
    probe_timeout: Duration,
    mut stop: broadcast::Receiver<()>,
) {
    tracing::info!(
        origin = %config.id,
        interval_ms = config.health_interval_ms,
        path = %config.health_path,
        "Health probe loop starting"
    );

    let mut ticker = time::interval(Duration::from_millis(config.health_interval_ms));
    // the first tick fires immediately; probe right away on startup
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                check_once(&client, &config, &state, probe_timeout).await;
            }
            _ = stop.recv() => {
                tracing::debug!(origin = %config.id, "Health probe loop stopping");
                break;
            }
        }
    }
}

async fn check_once(
    client: &reqwest::Client,
    config: &OriginConfig,
    state: &OriginState,
    probe_timeout: Duration,
) {
    let healthy = probe(client, config, probe_timeout).await;

    // At most one transition per check cycle.
    let transition = if healthy {
        state.record_probe_success(config.healthy_threshold)
    } else {
        state.record_probe_failure(config.unhealthy_threshold)
    };

    if let Some(new_state) = transition {
        tracing::info!(
            origin = %config.id,
            state = ?new_state,
            "Origin health state changed"
        );
    }

    metrics::record_origin_health(&config.id, state.is_eligible());
}

/// Issue one probe. Success is any 2xx/3xx response within the timeout.
async fn probe(client: &reqwest::Client, config: &OriginConfig, probe_timeout: Duration) -> bool {
    let method = config
        .health_method
        .parse::<Method>()
        .unwrap_or(Method::GET);
    let url = format!(
        "{}://{}{}",
        config.scheme(),
        config.authority(),
        config.health_path
    );

    let request = client
        .request(method, &url)
        .timeout(probe_timeout)
        .header("user-agent", "api-gateway-health-probe");

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let ok = status.is_success() || status.is_redirection();
            if !ok {
                tracing::warn!(
                    origin = %config.id,
                    status = %status,
                    "Health probe failed: non-success status"
                );
            }
            ok
        }
        Err(e) if e.is_timeout() => {
            tracing::warn!(origin = %config.id, "Health probe failed: timeout");
            false
        }
        Err(e) => {
            tracing::warn!(origin = %config.id, error = %e, "Health probe failed: connection error");
            false
        }
    }
}
