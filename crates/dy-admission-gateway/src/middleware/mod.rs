//! Middleware stack for the admission gateway.
//!
//! Layer order: Request → Tracing → Timeout → Session → Admission → CatchPanic → Handler
//!
//! Only the admission layer touches the namespace lock table. Everything
//! inside it (handler, panic guard) runs while a mutating request holds the
//! namespace; everything outside it can end the request early, which drops
//! the lease.

pub mod admission;
pub mod leased_body;
pub mod metrics;
pub mod session;
pub mod timeout;
pub mod tracing;

pub use admission::{Admission, AdmissionLayer, AdmissionTicket, Gatekeeper};
pub use leased_body::LeasedBody;
pub use metrics::{GatewayMetrics, Rejection};
pub use session::{SessionLayer, WEBHOOK_PREFIX};
pub use timeout::TimeoutLayer;
pub use self::tracing::TracingLayer;
