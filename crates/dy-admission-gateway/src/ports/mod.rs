//! Ports to the collaborators the gateway consumes but does not own.

pub mod outbound;

pub use outbound::{Authenticator, AuthenticatorProvider, ServiceManager, SessionResolver, WebhookResolver};
