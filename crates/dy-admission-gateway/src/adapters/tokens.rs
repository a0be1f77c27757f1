//! Bearer-token session resolver.
//!
//! Tokens are looked up by scanning the whole table with a constant-time
//! comparison, so lookup time does not depend on which token matched.

use crate::domain::error::GatewayError;
use crate::domain::session::UserSession;
use crate::ports::SessionResolver;
use async_trait::async_trait;
use axum::http::request::Parts;
use parking_lot::RwLock;

/// Alternate header for clients that cannot set `Authorization`
pub const AUTH_HEADER: &str = "x-dockyard-auth";

/// Maps issued tokens to sessions
#[derive(Default)]
pub struct TokenSessionResolver {
    sessions: RwLock<Vec<(String, UserSession)>>,
}

impl TokenSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue (or replace) the session behind `token`
    pub fn insert(&self, token: impl Into<String>, session: UserSession) {
        let token = token.into();
        let mut sessions = self.sessions.write();
        sessions.retain(|(existing, _)| existing != &token);
        sessions.push((token, session));
    }

    /// Revoke a token. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|(existing, _)| existing != token);
        sessions.len() != before
    }

    /// Mark every session of a namespace as loaded (or loading)
    pub fn set_initialized(&self, namespace: &str, initialized: bool) {
        for (_, session) in self.sessions.write().iter_mut() {
            if session.namespace.as_deref() == Some(namespace) {
                session.initialized = initialized;
            }
        }
    }

    fn lookup(&self, token: &str) -> Option<UserSession> {
        let sessions = self.sessions.read();
        let mut found = None;
        for (candidate, session) in sessions.iter() {
            if constant_time_compare(candidate, token) && found.is_none() {
                found = Some(session.clone());
            }
        }
        found
    }
}

#[async_trait]
impl SessionResolver for TokenSessionResolver {
    async fn resolve(&self, parts: &Parts) -> Result<Option<UserSession>, GatewayError> {
        Ok(token_from(parts).and_then(|token| self.lookup(token)))
    }
}

/// Extract the token from `Authorization: Bearer` or the alternate header
fn token_from(parts: &Parts) -> Option<&str> {
    if let Some(auth) = parts.headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim());
            }
        }
    }

    parts
        .headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    // Pad both to the longer length with different fill bytes so a length
    // mismatch can never compare equal
    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}
