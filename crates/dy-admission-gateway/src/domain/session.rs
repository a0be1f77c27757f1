//! Per-request session context deposited by the session layer.

use crate::ports::ServiceManager;
use std::fmt;
use std::sync::Arc;

/// Authenticated user bound (usually) to a tenant namespace
#[derive(Clone)]
pub struct UserSession {
    /// False while the user's backing data is still loading
    pub initialized: bool,
    /// Tenant namespace; required for every gated operation
    pub namespace: Option<String>,
    /// Tenant operational state, queried for running builds
    pub service_manager: Arc<dyn ServiceManager>,
}

impl UserSession {
    pub fn new(namespace: impl Into<String>, service_manager: Arc<dyn ServiceManager>) -> Self {
        Self {
            initialized: true,
            namespace: Some(namespace.into()),
            service_manager,
        }
    }

    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    pub fn without_namespace(mut self) -> Self {
        self.namespace = None;
        self
    }
}

impl fmt::Debug for UserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSession")
            .field("initialized", &self.initialized)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Request extension slot. Absent `user` means unauthenticated.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub user: Option<UserSession>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: UserSession) -> Self {
        Self { user: Some(user) }
    }

    /// Namespace of an authenticated, namespace-bound user
    pub fn namespace(&self) -> Option<&str> {
        self.user.as_ref()?.namespace.as_deref()
    }
}
