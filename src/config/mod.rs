//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (read, parse, validate)
//!     → schema.rs (typed GatewayConfig)
//!     → accepted into the running gateway (snapshot rebuild)
//!
//! On change:
//!     watcher.rs (notify) → loader.rs → mpsc channel of new configs
//! ```
//!
//! # Design Decisions
//! - Config is read-mostly; mutation flows through reload, never in place
//! - Validation collects every error before rejecting a file
//! - A rejected reload keeps the previous configuration running

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BalancePolicy, EndpointConfig, GatewayConfig, HealthProbeConfig, ListenerConfig,
    ObservabilityConfig, OriginConfig, RewriteConfig, RouteConfig,
};
