//! HTTP reverse-proxy / API gateway library.
//!
//! Accepts inbound HTTP requests, matches them against configured
//! endpoints, optionally invokes an externally supplied authentication
//! callback, selects a healthy origin via a load-balancing policy,
//! rewrites the URL, and relays the response, including streamed event
//! responses, while enforcing per-origin concurrency and rate limits.

pub mod auth;
pub mod balance;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use auth::{authenticator_fn, AuthRequest, AuthVerdict, Authenticator};
pub use config::GatewayConfig;
pub use http::{GatewayError, HttpServer};
pub use lifecycle::Shutdown;
