//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection
//!     → server.rs (Axum setup, static routes, snapshot state)
//!     → proxy.rs (pipeline: match → auth → select → admit → forward)
//!     → headers.rs (filters, injected headers)
//!     → error.rs (failure mode → status + JSON body)
//!     → Send to client
//! ```

pub mod error;
pub mod headers;
pub mod proxy;
pub mod server;

pub use error::GatewayError;
pub use headers::{HeaderFilter, X_FORWARDED_FOR, X_REQUEST_ID};
pub use server::{AppState, GatewaySnapshot, HttpServer};
