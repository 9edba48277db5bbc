//! API gateway binary.
//!
//! Loads configuration, wires observability, starts the HTTP server with
//! hot reload and health monitoring, and shuts down on Ctrl+C.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_gateway::config::loader::load_config;
use api_gateway::config::watcher::ConfigWatcher;
use api_gateway::config::GatewayConfig;
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::Shutdown;
use api_gateway::observability::metrics;

#[derive(Parser, Debug)]
#[command(name = "api-gateway", about = "HTTP reverse proxy / API gateway")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let config = if config_found {
        load_config(&args.config)?
    } else {
        GatewayConfig::default()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("api_gateway={},tower_http=warn", config.observability.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("api-gateway v0.1.0 starting");
    if !config_found {
        tracing::warn!(path = ?args.config, "Config file not found, using defaults");
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoints = config.endpoints.len(),
        origins = config.origins.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Hot reload: the watcher feeds full new configs to the server. The
    // notify handle must outlive the server or watching stops.
    let mut watcher_handle = None;
    let config_rx = if config_found {
        let (watcher, rx) = ConfigWatcher::new(&args.config);
        watcher_handle = Some(watcher.run()?);
        rx
    } else {
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let server = HttpServer::new(config)?;
    let server_task =
        tokio::spawn(async move { server.run(listener, config_rx, server_shutdown).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();

    server_task.await??;
    drop(watcher_handle);
    tracing::info!("Shutdown complete");
    Ok(())
}
