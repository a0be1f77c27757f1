//! Session injection.
//!
//! Resolves the caller and stores a [`SessionContext`] in the request
//! extensions for the admission layer. Paths under `/webhooks/` first try
//! the signed-callback resolver; if that does not produce a session the full
//! resolver runs as usual.

use crate::domain::session::SessionContext;
use crate::ports::{SessionResolver, WebhookResolver};
use axum::{
    body::Body,
    http::{request::Parts, Request},
    response::Response,
};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Path prefix served by the signed-callback resolver
pub const WEBHOOK_PREFIX: &str = "/webhooks/";

#[derive(Clone)]
struct Resolvers {
    sessions: Arc<dyn SessionResolver>,
    webhooks: Option<Arc<dyn WebhookResolver>>,
}

impl Resolvers {
    async fn resolve(&self, parts: &Parts) -> SessionContext {
        if parts.uri.path().starts_with(WEBHOOK_PREFIX) {
            if let Some(webhooks) = &self.webhooks {
                match webhooks.resolve_webhook(parts).await {
                    Ok(Some(user)) => {
                        debug!(namespace = ?user.namespace, "Webhook caller authenticated");
                        return SessionContext::authenticated(user);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Webhook resolver failed"),
                }
            }
        }

        match self.sessions.resolve(parts).await {
            Ok(user) => SessionContext { user },
            Err(e) => {
                warn!(error = %e, path = parts.uri.path(), "Session resolver failed");
                SessionContext::anonymous()
            }
        }
    }
}

/// Session layer
#[derive(Clone)]
pub struct SessionLayer {
    resolvers: Resolvers,
}

impl SessionLayer {
    pub fn new(
        sessions: Arc<dyn SessionResolver>,
        webhooks: Option<Arc<dyn WebhookResolver>>,
    ) -> Self {
        Self {
            resolvers: Resolvers { sessions, webhooks },
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionService {
            inner,
            resolvers: self.resolvers.clone(),
        }
    }
}

/// Session service
#[derive(Clone)]
pub struct SessionService<S> {
    inner: S,
    resolvers: Resolvers,
}

impl<S> Service<Request<Body>> for SessionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let resolvers = self.resolvers.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // An embedder may already have deposited a context upstream
            if req.extensions().get::<SessionContext>().is_some() {
                return inner.call(req).await;
            }

            let (mut parts, body) = req.into_parts();
            let context = resolvers.resolve(&parts).await;
            parts.extensions.insert(context);

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}
