//! Domain types for the admission gateway.
//!
//! Configuration, wire status codes, the per-request session context and the
//! namespace lock table.

pub mod config;
pub mod correlation;
pub mod error;
pub mod lock_table;
pub mod methods;
pub mod session;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig};
pub use correlation::RequestId;
pub use error::{ApiResponse, ApiStatus, GatewayError, HandlerError, HandlerResult};
pub use lock_table::{NamespaceLease, NamespaceLockTable};
pub use methods::RequestKind;
pub use session::{SessionContext, UserSession};
