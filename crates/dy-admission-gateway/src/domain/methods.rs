//! Request classification for admission.

use axum::http::Method;

/// How a request interacts with namespace state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Pure retrieval; never locks
    ReadOnly,
    /// Anything else; serialized per namespace
    Mutating,
}

impl RequestKind {
    /// Only `GET` is treated as retrieval. `HEAD` and `OPTIONS` are not
    /// special-cased and go through the lock like any other method.
    pub fn classify(method: &Method) -> Self {
        if method == Method::GET {
            RequestKind::ReadOnly
        } else {
            RequestKind::Mutating
        }
    }

    pub fn is_mutating(self) -> bool {
        self == RequestKind::Mutating
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::ReadOnly => "read_only",
            RequestKind::Mutating => "mutating",
        }
    }
}
