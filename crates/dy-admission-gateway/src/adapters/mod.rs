//! Adapters for the admission gateway.
//!
//! In-process implementations of the ports, used by the `dy-gateway`
//! binary for single-node deployments and by the test suites.

pub mod builds;
pub mod credentials;
pub mod tokens;
pub mod webhook;

pub use builds::BuildTracker;
pub use credentials::{InMemoryAuthenticator, InMemoryAuthenticatorProvider, MIN_PASSWORD_LENGTH};
pub use tokens::{constant_time_compare, TokenSessionResolver, AUTH_HEADER};
pub use webhook::{sign_webhook, SignedWebhookResolver};
