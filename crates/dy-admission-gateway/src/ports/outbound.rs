//! Outbound ports for the admission gateway.

use crate::domain::error::{GatewayError, HandlerResult};
use crate::domain::session::UserSession;
use async_trait::async_trait;
use axum::http::request::Parts;
use std::sync::Arc;

/// Build-state oracle for one tenant namespace.
pub trait ServiceManager: Send + Sync {
    /// Name of the application currently building, if any
    fn active_build(&self) -> Option<String>;
}

/// Full session resolution (cookie or token auth).
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` means the caller is not authenticated.
    async fn resolve(&self, parts: &Parts) -> Result<Option<UserSession>, GatewayError>;
}

/// Weaker authentication for signed callbacks under `/webhooks/`.
#[async_trait]
pub trait WebhookResolver: Send + Sync {
    async fn resolve_webhook(&self, parts: &Parts) -> Result<Option<UserSession>, GatewayError>;
}

/// Credential operations for one namespace.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Domain failures (wrong password, weak password) come back as
    /// `HandlerError::Domain`.
    async fn change_password(&self, old_password: &str, new_password: &str) -> HandlerResult<()>;
}

/// Looks up the authenticator for a namespace.
pub trait AuthenticatorProvider: Send + Sync {
    fn get(&self, namespace: &str) -> Arc<dyn Authenticator>;
}
