//! User router assembly.
//!
//! Every route below the user API mount point, including the embedder's
//! sub-routers and unmatched paths, passes through session injection and
//! admission first.

use crate::domain::lock_table::NamespaceLockTable;
use crate::handlers::change_password;
use crate::middleware::{AdmissionLayer, GatewayMetrics, SessionLayer};
use crate::ports::{AuthenticatorProvider, SessionResolver, WebhookResolver};
use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

/// External collaborators the gateway is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionResolver>,
    /// None disables the signed-callback path
    pub webhooks: Option<Arc<dyn WebhookResolver>>,
    pub authenticators: Arc<dyn AuthenticatorProvider>,
}

/// State shared by handlers mounted on the user router
#[derive(Clone)]
pub struct GatewayState {
    pub locks: Arc<NamespaceLockTable>,
    pub metrics: Arc<GatewayMetrics>,
    pub authenticators: Arc<dyn AuthenticatorProvider>,
}

/// Business endpoints mounted under fixed prefixes, after admission
#[derive(Default)]
pub struct DownstreamRouters {
    pub webhooks: Router,
    pub system: Router,
    pub app_definitions: Router,
    pub app_data: Router,
}

impl DownstreamRouters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn webhooks(mut self, router: Router) -> Self {
        self.webhooks = router;
        self
    }

    pub fn system(mut self, router: Router) -> Self {
        self.system = router;
        self
    }

    pub fn app_definitions(mut self, router: Router) -> Self {
        self.app_definitions = router;
        self
    }

    pub fn app_data(mut self, router: Router) -> Self {
        self.app_data = router;
        self
    }
}

/// Builder for the user API router
pub struct UserRouter;

impl UserRouter {
    pub fn build(
        state: GatewayState,
        collaborators: &Collaborators,
        downstream: DownstreamRouters,
    ) -> Router {
        let admission = AdmissionLayer::new(Arc::clone(&state.locks), Arc::clone(&state.metrics));
        let session = SessionLayer::new(
            Arc::clone(&collaborators.sessions),
            collaborators.webhooks.clone(),
        );

        Router::new()
            .route("/changepassword", post(change_password))
            .route("/changepassword/", post(change_password))
            .with_state(state)
            .nest("/webhooks", downstream.webhooks)
            .nest("/system", downstream.system)
            .nest("/appDefinitions", downstream.app_definitions)
            .nest("/appData", downstream.app_data)
            // innermost first
            .layer(CatchPanicLayer::new())
            .layer(admission)
            .layer(session)
    }
}
