//! Request timeout middleware.
//!
//! When the deadline passes the inner future is dropped, which also drops any
//! namespace lease it was holding.

use crate::domain::error::{ApiResponse, ApiStatus};
use crate::middleware::metrics::GatewayMetrics;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::{Layer, Service};
use tracing::warn;

/// Timeout layer
#[derive(Clone)]
pub struct TimeoutLayer {
    limit: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl TimeoutLayer {
    pub fn new(limit: Duration, metrics: Arc<GatewayMetrics>) -> Self {
        Self { limit, metrics }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            limit: self.limit,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

/// Timeout service
#[derive(Clone)]
pub struct TimeoutService<S> {
    inner: S,
    limit: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl<S> Service<Request<Body>> for TimeoutService<S>
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
        let limit = self.limit;
        let metrics = Arc::clone(&self.metrics);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let path = req.uri().path().to_string();
            match timeout(limit, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    metrics.record_timeout();
                    warn!(timeout_ms = limit.as_millis() as u64, path = %path, "Request timed out");
                    Ok(timeout_response())
                }
            }
        })
    }
}

fn timeout_response() -> Response {
    (
        StatusCode::GATEWAY_TIMEOUT,
        Json(ApiResponse::new(ApiStatus::GenericConflict, "Request timed out")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let metrics = Arc::new(GatewayMetrics::new());
        let slow = tower::service_fn(|_req: Request<Body>| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<Response, Infallible>(StatusCode::OK.into_response())
        });

        let response = TimeoutLayer::new(Duration::from_millis(20), Arc::clone(&metrics))
            .layer(slow)
            .oneshot(Request::builder().body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            metrics.timeouts.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_fast_request_passes() {
        let metrics = Arc::new(GatewayMetrics::new());
        let fast = tower::service_fn(|_req: Request<Body>| async {
            Ok::<Response, Infallible>(StatusCode::CREATED.into_response())
        });

        let response = TimeoutLayer::new(Duration::from_secs(1), metrics)
            .layer(fast)
            .oneshot(Request::builder().body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
