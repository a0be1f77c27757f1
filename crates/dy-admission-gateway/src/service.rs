//! Gateway server - owns the lock table and serves the user API.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::lock_table::NamespaceLockTable;
use crate::middleware::{GatewayMetrics, TimeoutLayer, TracingLayer};
use crate::router::{Collaborators, DownstreamRouters, GatewayState, UserRouter};
use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Admission gateway server
pub struct GatewayServer {
    config: GatewayConfig,
    collaborators: Collaborators,
    locks: Arc<NamespaceLockTable>,
    metrics: Arc<GatewayMetrics>,
    downstream: Option<DownstreamRouters>,
}

impl GatewayServer {
    /// Create a new gateway server; the lock table is created here, once
    pub fn new(
        config: GatewayConfig,
        collaborators: Collaborators,
        downstream: DownstreamRouters,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            collaborators,
            locks: Arc::new(NamespaceLockTable::new()),
            metrics: Arc::new(GatewayMetrics::new()),
            downstream: Some(downstream),
        })
    }

    pub fn locks(&self) -> Arc<NamespaceLockTable> {
        Arc::clone(&self.locks)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the full application router.
    ///
    /// Downstream routers are consumed on the first call; later calls mount
    /// empty ones.
    pub fn router(&mut self) -> Router {
        let state = GatewayState {
            locks: Arc::clone(&self.locks),
            metrics: Arc::clone(&self.metrics),
            authenticators: Arc::clone(&self.collaborators.authenticators),
        };
        let downstream = self.downstream.take().unwrap_or_default();
        let user_router = UserRouter::build(state, &self.collaborators, downstream);

        let metrics = Arc::clone(&self.metrics);
        let locks = Arc::clone(&self.locks);

        Router::new()
            .route("/health", get(health_check))
            .route(
                "/metrics",
                get(move || {
                    let metrics = Arc::clone(&metrics);
                    let locks = Arc::clone(&locks);
                    async move {
                        let mut body = metrics.to_json();
                        body["locked_namespaces"] = serde_json::json!(locks.locked_namespaces());
                        Json(body)
                    }
                }),
            )
            .nest_service(&self.config.http.base_path, user_router)
            .layer(DefaultBodyLimit::max(self.config.limits.max_request_size))
            .layer(TimeoutLayer::new(
                self.config.timeouts.request,
                Arc::clone(&self.metrics),
            ))
            .layer(TracingLayer::new())
    }

    /// Serve until `shutdown` resolves (graceful) or the listener fails
    pub async fn start<F>(&mut self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.http.enabled {
            info!("HTTP server disabled, nothing to serve");
            return Ok(());
        }

        let addr = self.config.http_addr();
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;

        info!(
            addr = %addr,
            base_path = %self.config.http.base_path,
            webhooks = self.collaborators.webhooks.is_some(),
            "Admission gateway listening"
        );

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Received shutdown signal");
            })
            .await;

        if let Err(e) = &result {
            error!(error = %e, "HTTP server error");
        }
        info!("Admission gateway stopped");
        result.map_err(GatewayError::from)
    }
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}
