//! Signed webhook callbacks.
//!
//! Git hosts call `/webhooks/...?namespace=<ns>&app=<app>&token=<sig>` where
//! `sig` is hex HMAC-SHA256 over `"<ns>:<app>"` with the gateway's webhook
//! secret. A valid signature yields a session for the namespace; the request
//! then goes through admission like any other.

use crate::domain::error::GatewayError;
use crate::domain::session::UserSession;
use crate::ports::{ServiceManager, WebhookResolver};
use async_trait::async_trait;
use axum::extract::Query;
use axum::http::request::Parts;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Callback query, percent-decoded
#[derive(Debug, Deserialize)]
struct WebhookQuery {
    namespace: String,
    app: String,
    token: String,
}

/// Compute the callback token for an app
pub fn sign_webhook(secret: &[u8], namespace: &str, app: &str) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| GatewayError::Config(format!("invalid webhook secret: {}", e)))?;
    mac.update(namespace.as_bytes());
    mac.update(b":");
    mac.update(app.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Resolves sessions for signed webhook calls
pub struct SignedWebhookResolver {
    secret: Vec<u8>,
    namespaces: DashMap<String, Arc<dyn ServiceManager>>,
}

impl SignedWebhookResolver {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            namespaces: DashMap::new(),
        }
    }

    /// Accept callbacks for `namespace`, reporting builds from `service_manager`
    pub fn register_namespace(&self, namespace: &str, service_manager: Arc<dyn ServiceManager>) {
        self.namespaces.insert(namespace.to_string(), service_manager);
    }

    fn verify(&self, namespace: &str, app: &str, token: &str) -> bool {
        let Ok(signature) = hex::decode(token) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return false;
        };
        mac.update(namespace.as_bytes());
        mac.update(b":");
        mac.update(app.as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

#[async_trait]
impl WebhookResolver for SignedWebhookResolver {
    async fn resolve_webhook(&self, parts: &Parts) -> Result<Option<UserSession>, GatewayError> {
        let Ok(Query(query)) = Query::<WebhookQuery>::try_from_uri(&parts.uri) else {
            return Ok(None);
        };
        let (namespace, app) = (query.namespace.as_str(), query.app.as_str());

        if !self.verify(namespace, app, &query.token) {
            warn!(namespace, app, "Webhook signature rejected");
            return Ok(None);
        }

        let Some(service_manager) = self.namespaces.get(namespace).map(|e| Arc::clone(e.value()))
        else {
            debug!(namespace, "Webhook for unknown namespace");
            return Ok(None);
        };

        Ok(Some(UserSession::new(namespace, service_manager)))
    }
}
