//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the config snapshot (routes, rewrites, filters, runtime state)
//! - Create the Axum router with static handlers and the proxy catch-all
//! - Wire middleware (outer timeout, tracing)
//! - Swap snapshots on config reload, restarting health monitors
//! - Serve with graceful shutdown

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Authenticator;
use crate::balance::registry::Registry;
use crate::config::schema::{EndpointConfig, GatewayConfig};
use crate::health::monitor::HealthMonitor;
use crate::http::headers::HeaderFilter;
use crate::http::proxy::{preflight_response, proxy_handler};
use crate::routing::matcher::RouteTable;
use crate::routing::pattern::PatternError;
use crate::routing::rewrite::RewriteEngine;

/// Everything derived from one accepted configuration.
///
/// Immutable once built; in-flight requests keep the snapshot they loaded
/// even while a reload swaps in a new one.
pub struct GatewaySnapshot {
    pub config: GatewayConfig,
    pub endpoints: HashMap<String, EndpointConfig>,
    pub routes: RouteTable,
    pub rewrites: HashMap<String, RewriteEngine>,
    pub filters: HashMap<String, HeaderFilter>,
    pub registry: Registry,
}

impl GatewaySnapshot {
    /// Compile routes, rewrites and filters and build fresh runtime state.
    pub fn build(config: GatewayConfig) -> Result<Self, PatternError> {
        let routes = RouteTable::from_config(&config.endpoints)?;

        let mut endpoints = HashMap::new();
        let mut rewrites = HashMap::new();
        let mut filters = HashMap::new();
        for endpoint in &config.endpoints {
            rewrites.insert(
                endpoint.id.clone(),
                RewriteEngine::from_config(&endpoint.rewrites)?,
            );
            filters.insert(
                endpoint.id.clone(),
                HeaderFilter::new(
                    config
                        .blocked_headers
                        .iter()
                        .chain(endpoint.blocked_headers.iter())
                        .map(String::as_str),
                ),
            );
            endpoints.insert(endpoint.id.clone(), endpoint.clone());
        }

        let registry = Registry::from_config(&config);

        Ok(Self {
            config,
            endpoints,
            routes,
            rewrites,
            filters,
            registry,
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ArcSwap<GatewaySnapshot>>,
    pub client: reqwest::Client,
    pub authenticator: Option<Authenticator>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with no authentication callback.
    pub fn new(config: GatewayConfig) -> Result<Self, PatternError> {
        Self::with_authenticator(config, None)
    }

    /// Create a server, optionally wiring the embedding application's
    /// authentication callback.
    pub fn with_authenticator(
        config: GatewayConfig,
        authenticator: Option<Authenticator>,
    ) -> Result<Self, PatternError> {
        let snapshot = GatewaySnapshot::build(config.clone())?;
        let state = AppState {
            snapshot: Arc::new(ArcSwap::from_pointee(snapshot)),
            client: reqwest::Client::new(),
            authenticator,
        };
        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            state,
            config,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(root_handler))
            .route("/favicon.ico", any(favicon_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until shutdown, applying config updates as they come.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoints = self.config.endpoints.len(),
            origins = self.config.origins.len(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(Duration::from_millis(
            self.config.health.probe_timeout_ms,
        ));
        {
            let snapshot = self.state.snapshot.load();
            monitor.spawn(&self.config, |id| snapshot.registry.origin(id));
        }

        // Reload loop: swap the snapshot and restart health monitors.
        let reload_state = self.state.clone();
        tokio::spawn(async move {
            let mut monitor = monitor;
            while let Some(new_config) = config_updates.recv().await {
                match GatewaySnapshot::build(new_config.clone()) {
                    Ok(snapshot) => {
                        let snapshot = Arc::new(snapshot);
                        reload_state.snapshot.store(snapshot.clone());
                        monitor.stop();
                        monitor = HealthMonitor::new(Duration::from_millis(
                            new_config.health.probe_timeout_ms,
                        ));
                        monitor.spawn(&new_config, |id| snapshot.registry.origin(id));
                        tracing::info!("Configuration reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded configuration");
                    }
                }
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the initial config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Fixed static response for `/`, served outside the proxy pipeline.
async fn root_handler(request: axum::extract::Request) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }
    (StatusCode::OK, "api-gateway").into_response()
}

/// Fixed static response for `/favicon.ico`.
async fn favicon_handler(request: axum::extract::Request) -> Response {
    if request.method() == Method::OPTIONS {
        return preflight_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
