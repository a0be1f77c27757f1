//! Request span and request ID propagation.
//!
//! The span declares a `namespace` field left empty here; the admission layer
//! fills it in once the session is known.

use crate::domain::correlation::{RequestId, REQUEST_ID_HEADER};
use axum::{body::Body, http::Request, response::Response};
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{field::Empty, info_span, Instrument, Span};

/// Tracing layer that creates a span for each request
#[derive(Clone, Default)]
pub struct TracingLayer;

impl TracingLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService { inner }
    }
}

/// Tracing service
#[derive(Clone)]
pub struct TracingService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for TracingService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        let request_id = RequestId::from_headers(req.headers());
        req.extensions_mut().insert(request_id);

        let span = info_span!(
            "api_request",
            request_id = %request_id,
            http.method = %req.method(),
            http.target = %req.uri().path(),
            namespace = Empty,
            http.status = Empty,
        );

        Box::pin(
            async move {
                let mut response = inner.call(req).await?;

                Span::current().record("http.status", response.status().as_u16());
                response
                    .headers_mut()
                    .insert(REQUEST_ID_HEADER, request_id.header_value());

                Ok(response)
            }
            .instrument(span),
        )
    }
}
