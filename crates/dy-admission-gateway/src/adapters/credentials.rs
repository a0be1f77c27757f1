//! In-memory password store implementing the authenticator port.
//!
//! Passwords are kept as SHA-256 digests salted with the namespace name.

use crate::domain::error::{ApiStatus, HandlerError, HandlerResult};
use crate::ports::{Authenticator, AuthenticatorProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::info;

/// Shortest password accepted on change
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Credentials of a single namespace
pub struct InMemoryAuthenticator {
    namespace: String,
    digest: Mutex<[u8; 32]>,
}

impl InMemoryAuthenticator {
    pub fn new(namespace: impl Into<String>, password: &str) -> Self {
        let namespace = namespace.into();
        let digest = password_digest(&namespace, password);
        Self {
            namespace,
            digest: Mutex::new(digest),
        }
    }

    pub fn verify(&self, password: &str) -> bool {
        let candidate = password_digest(&self.namespace, password);
        self.digest.lock()[..].ct_eq(&candidate[..]).into()
    }
}

#[async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn change_password(&self, old_password: &str, new_password: &str) -> HandlerResult<()> {
        if !self.verify(old_password) {
            return Err(HandlerError::domain(
                ApiStatus::WrongPassword,
                "Old password is incorrect.",
            ));
        }

        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(HandlerError::domain(
                ApiStatus::IllegalParameter,
                "Password is too small.",
            ));
        }

        *self.digest.lock() = password_digest(&self.namespace, new_password);
        info!(namespace = %self.namespace, "Password changed");
        Ok(())
    }
}

/// Per-namespace authenticators
#[derive(Default)]
pub struct InMemoryAuthenticatorProvider {
    authenticators: DashMap<String, Arc<InMemoryAuthenticator>>,
}

impl InMemoryAuthenticatorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace with its initial password
    pub fn register(&self, namespace: &str, password: &str) -> Arc<InMemoryAuthenticator> {
        let authenticator = Arc::new(InMemoryAuthenticator::new(namespace, password));
        self.authenticators
            .insert(namespace.to_string(), Arc::clone(&authenticator));
        authenticator
    }
}

impl AuthenticatorProvider for InMemoryAuthenticatorProvider {
    fn get(&self, namespace: &str) -> Arc<dyn Authenticator> {
        if let Some(entry) = self.authenticators.get(namespace) {
            let authenticator: Arc<InMemoryAuthenticator> = Arc::clone(entry.value());
            return authenticator;
        }
        Arc::new(UnknownNamespace(namespace.to_string()))
    }
}

/// Authenticator for a namespace with no stored credentials
struct UnknownNamespace(String);

#[async_trait]
impl Authenticator for UnknownNamespace {
    async fn change_password(&self, _old: &str, _new: &str) -> HandlerResult<()> {
        Err(HandlerError::internal(format!(
            "no credentials stored for namespace {}",
            self.0
        )))
    }
}

fn password_digest(namespace: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
