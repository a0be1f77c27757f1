// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Dockyard Admission Gateway - per-namespace request gating for the user API.
//!
//! Every request under the user API mount point is checked before any
//! business handler runs. Mutating requests take an exclusive lock on the
//! caller's namespace for their whole lifetime; read-only requests are only
//! checked for a session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        ADMISSION GATEWAY (dy-gateway)                       │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────────────┐        │
//! │  │   /health   │  │  /metrics   │  │  /api/v2/user (user router)  │        │
//! │  └─────────────┘  └─────────────┘  └──────────────┬───────────────┘        │
//! │                                                   │                         │
//! │  ┌────────────────────────────────────────────────┴──────┐                 │
//! │  │                  Middleware Stack                      │                 │
//! │  │  Tracing → Timeout → Session → Admission → CatchPanic │                 │
//! │  └────────────────────┬───────────────────────────────────┘                 │
//! │                       │                                                     │
//! │  ┌────────────────────┴───────────────────────┐                            │
//! │  │           Namespace Lock Table             │                            │
//! │  │   (lease released when the response ends)  │                            │
//! │  └────────────────────┬───────────────────────┘                            │
//! └───────────────────────┼─────────────────────────────────────────────────────┘
//!                         │
//!     ┌───────────────────┼───────────────┬───────────────────┐
//!     ▼                   ▼               ▼                   ▼
//! /webhooks           /system     /appDefinitions         /appData
//! ```
//!
//! # Admission Order
//!
//! 1. No session → `NOT_AUTHORIZED`
//! 2. Session not initialized → `USER_NOT_INITIALIZED`
//! 3. No namespace → `NOT_AUTHORIZED`
//! 4. `GET` → admitted, no lock
//! 5. Namespace locked → `GENERIC` ("Another operation still in progress...")
//! 6. Build running → `GENERIC` ("An active build (...) is in progress...")
//! 7. Acquire the namespace lock, released when the request completes
//!
//! # Usage
//!
//! ```ignore
//! use dy_admission_gateway::{Collaborators, DownstreamRouters, GatewayConfig, GatewayServer};
//!
//! let config = GatewayConfig::default();
//! let mut server = GatewayServer::new(config, collaborators, DownstreamRouters::new())?;
//! server.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

// #![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;
pub mod telemetry;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiResponse, ApiStatus, GatewayError, HandlerError, HandlerResult};
pub use domain::lock_table::{NamespaceLease, NamespaceLockTable};
pub use domain::methods::RequestKind;
pub use domain::session::{SessionContext, UserSession};
pub use middleware::GatewayMetrics;
pub use router::{Collaborators, DownstreamRouters, GatewayState, UserRouter};
pub use service::GatewayServer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_only_get_is_read_only() {
        assert_eq!(
            RequestKind::classify(&axum::http::Method::GET),
            RequestKind::ReadOnly
        );
        assert!(RequestKind::classify(&axum::http::Method::HEAD).is_mutating());
    }
}
