//! Admission gatekeeper.
//!
//! Runs after session injection and decides, per request, between:
//! reject with a structured [`ApiResponse`], admit without a lock (`GET`), or
//! admit holding the namespace lock until the response is finished.
//!
//! Checks, first failure wins:
//! 1. no session                      -> NOT_AUTHORIZED
//! 2. session not initialized         -> USER_NOT_INITIALIZED
//! 3. session has no namespace        -> NOT_AUTHORIZED
//! 4. `GET`                           -> admitted, no lock
//! 5. namespace already locked        -> GENERIC_CONFLICT
//! 6. a build is running              -> GENERIC_CONFLICT (names the app)
//! 7. acquire lock, admit
//!
//! The whole decision is synchronous and made in `Service::call` before the
//! inner service is polled.

use crate::domain::error::ApiResponse;
use crate::domain::lock_table::{NamespaceLease, NamespaceLockTable};
use crate::domain::methods::RequestKind;
use crate::domain::session::SessionContext;
use crate::middleware::leased_body::attach_ticket;
use crate::middleware::metrics::{GatewayMetrics, Rejection};
use axum::{
    body::Body,
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tower::{Layer, Service};
use tracing::{debug, info, Span};

/// Namespace lease plus bookkeeping; dropping it releases the namespace.
pub struct AdmissionTicket {
    lease: NamespaceLease,
    metrics: Arc<GatewayMetrics>,
    acquired_at: Instant,
}

impl AdmissionTicket {
    pub fn new(lease: NamespaceLease, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            lease,
            metrics,
            acquired_at: Instant::now(),
        }
    }

    pub fn namespace(&self) -> &str {
        self.lease.namespace()
    }
}

impl Drop for AdmissionTicket {
    fn drop(&mut self) {
        self.metrics.record_release();
        debug!(
            namespace = self.lease.namespace(),
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Releasing namespace lease"
        );
    }
}

/// Outcome of the admission checks
pub enum Admission {
    /// Proceed without touching the lock table
    ReadOnly,
    /// Proceed; the ticket must outlive the response
    Mutating(AdmissionTicket),
    /// Stop here and send this response
    Rejected(Rejection, ApiResponse),
}

impl Admission {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Admission::Rejected(..))
    }
}

/// Decision logic, independent of the tower plumbing
#[derive(Clone)]
pub struct Gatekeeper {
    locks: Arc<NamespaceLockTable>,
    metrics: Arc<GatewayMetrics>,
}

impl Gatekeeper {
    pub fn new(locks: Arc<NamespaceLockTable>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { locks, metrics }
    }

    pub fn evaluate(&self, session: Option<&SessionContext>, method: &Method) -> Admission {
        let Some(user) = session.and_then(|ctx| ctx.user.as_ref()) else {
            return self.reject(Rejection::NoSession, ApiResponse::not_authorized());
        };

        if !user.initialized {
            return self.reject(
                Rejection::UserNotInitialized,
                ApiResponse::user_not_initialized(),
            );
        }

        let Some(namespace) = user.namespace.as_deref().filter(|ns| !ns.is_empty()) else {
            return self.reject(Rejection::NoNamespace, ApiResponse::namespace_not_found());
        };
        Span::current().record("namespace", namespace);

        let kind = RequestKind::classify(method);
        if !kind.is_mutating() {
            self.metrics.record_admission(kind);
            debug!(namespace, method = %method, kind = kind.as_str(), "Admitted request");
            return Admission::ReadOnly;
        }

        if self.locks.is_locked(namespace) {
            info!(namespace, method = %method, "Namespace busy, rejecting mutation");
            return self.reject(Rejection::NamespaceLocked, ApiResponse::operation_in_progress());
        }

        if let Some(app_name) = user.service_manager.active_build() {
            info!(namespace, app = %app_name, "Build running, rejecting mutation");
            return self.reject(
                Rejection::BuildRunning,
                ApiResponse::build_in_progress(&app_name),
            );
        }

        // Lost a race with another worker thread between the check above and here
        let Some(lease) = self.locks.try_lease(namespace) else {
            info!(namespace, method = %method, "Namespace taken concurrently, rejecting mutation");
            return self.reject(Rejection::NamespaceLocked, ApiResponse::operation_in_progress());
        };

        self.metrics.record_admission(kind);
        debug!(namespace, method = %method, kind = kind.as_str(), "Admitted request");
        Admission::Mutating(AdmissionTicket::new(lease, Arc::clone(&self.metrics)))
    }

    fn reject(&self, reason: Rejection, response: ApiResponse) -> Admission {
        self.metrics.record_rejection(reason);
        debug!(
            reason = reason.as_str(),
            status = %response.status,
            "Request rejected at admission"
        );
        Admission::Rejected(reason, response)
    }
}

/// Admission layer
#[derive(Clone)]
pub struct AdmissionLayer {
    gatekeeper: Gatekeeper,
}

impl AdmissionLayer {
    pub fn new(locks: Arc<NamespaceLockTable>, metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            gatekeeper: Gatekeeper::new(locks, metrics),
        }
    }
}

impl<S> Layer<S> for AdmissionLayer {
    type Service = AdmissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdmissionService {
            inner,
            gatekeeper: self.gatekeeper.clone(),
        }
    }
}

/// Admission service
#[derive(Clone)]
pub struct AdmissionService<S> {
    inner: S,
    gatekeeper: Gatekeeper,
}

impl<S> Service<Request<Body>> for AdmissionService<S>
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
        let admission = self
            .gatekeeper
            .evaluate(req.extensions().get::<SessionContext>(), req.method());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match admission {
                Admission::Rejected(_, response) => Ok(response.into_response()),
                Admission::ReadOnly => inner.call(req).await,
                Admission::Mutating(ticket) => {
                    // If this future is dropped or the handler errors, the
                    // ticket goes with it. Otherwise it rides on the body.
                    let response = inner.call(req).await?;
                    Ok(attach_ticket(response, ticket))
                }
            }
        })
    }
}
