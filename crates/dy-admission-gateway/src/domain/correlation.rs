//! Request ID for log correlation.
//!
//! Uses UUID v7 so IDs sort by arrival time. A client-supplied ID is kept
//! when it parses; anything else is replaced.

use axum::http::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Header carrying the request ID in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }

    /// Reuse a well-formed incoming ID, otherwise mint one
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Self::parse(s).ok())
            .unwrap_or_default()
    }

    pub fn header_value(&self) -> HeaderValue {
        let mut buf = Uuid::encode_buffer();
        // Hyphenated UUIDs are plain ASCII
        HeaderValue::from_str(self.0.hyphenated().encode_lower(&mut buf))
            .unwrap_or_else(|_| HeaderValue::from_static("invalid"))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_v7() {
        let id = RequestId::new();
        assert_ne!(id, RequestId::new());
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_incoming_header_reused() {
        let id = RequestId::new();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, id.header_value());

        assert_eq!(RequestId::from_headers(&headers), id);
    }

    #[test]
    fn test_garbage_header_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));

        let id = RequestId::from_headers(&headers);
        assert_eq!(id.as_uuid().get_version_num(), 7);
        assert!(RequestId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_header_value_matches_display() {
        let id = RequestId::new();
        assert_eq!(id.header_value().to_str().unwrap(), id.to_string());
    }
}
