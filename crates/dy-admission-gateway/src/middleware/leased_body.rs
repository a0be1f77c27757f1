//! Response body that carries a namespace lease until the response is done.
//!
//! The lease is dropped when the inner body reports end-of-stream or an
//! error, or when the body itself is dropped (client went away, server
//! aborted the connection). Whichever happens first releases the namespace;
//! the rest are no-ops.

use crate::middleware::admission::AdmissionTicket;
use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    pub struct LeasedBody {
        #[pin]
        inner: Body,
        ticket: Option<AdmissionTicket>,
    }
}

impl LeasedBody {
    pub fn new(inner: Body, ticket: AdmissionTicket) -> Self {
        Self {
            inner,
            ticket: Some(ticket),
        }
    }

    /// True while the namespace is still held by this body
    pub fn holds_lease(&self) -> bool {
        self.ticket.is_some()
    }
}

impl HttpBody for LeasedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = this.inner.poll_frame(cx);
        if matches!(polled, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            this.ticket.take();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Move the ticket into the response body
pub fn attach_ticket(response: Response, ticket: AdmissionTicket) -> Response {
    response.map(|body| Body::new(LeasedBody::new(body, ticket)))
}
