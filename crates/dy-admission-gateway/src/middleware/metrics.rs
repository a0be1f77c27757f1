//! Admission counters, exported as JSON on the root router.

use crate::domain::methods::RequestKind;
use std::sync::atomic::{AtomicU64, Ordering};

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoSession,
    UserNotInitialized,
    NoNamespace,
    NamespaceLocked,
    BuildRunning,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::NoSession => "no_session",
            Rejection::UserNotInitialized => "user_not_initialized",
            Rejection::NoNamespace => "no_namespace",
            Rejection::NamespaceLocked => "namespace_locked",
            Rejection::BuildRunning => "build_running",
        }
    }
}

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Admissions
    pub admitted_read_only: AtomicU64,
    pub admitted_mutating: AtomicU64,

    // Rejections
    pub rejected_no_session: AtomicU64,
    pub rejected_uninitialized: AtomicU64,
    pub rejected_no_namespace: AtomicU64,
    pub rejected_namespace_locked: AtomicU64,
    pub rejected_build_running: AtomicU64,

    // Lease lifecycle
    pub leases_released: AtomicU64,

    pub timeouts: AtomicU64,
    pub internal_errors: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admission(&self, kind: RequestKind) {
        match kind {
            RequestKind::ReadOnly => self.admitted_read_only.fetch_add(1, Ordering::Relaxed),
            RequestKind::Mutating => self.admitted_mutating.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_rejection(&self, reason: Rejection) {
        let counter = match reason {
            Rejection::NoSession => &self.rejected_no_session,
            Rejection::UserNotInitialized => &self.rejected_uninitialized,
            Rejection::NoNamespace => &self.rejected_no_namespace,
            Rejection::NamespaceLocked => &self.rejected_namespace_locked,
            Rejection::BuildRunning => &self.rejected_build_running,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_release(&self) {
        self.leases_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Mutating admissions whose lease has not been released yet
    pub fn leases_outstanding(&self) -> u64 {
        self.admitted_mutating
            .load(Ordering::Relaxed)
            .saturating_sub(self.leases_released.load(Ordering::Relaxed))
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected_no_session.load(Ordering::Relaxed)
            + self.rejected_uninitialized.load(Ordering::Relaxed)
            + self.rejected_no_namespace.load(Ordering::Relaxed)
            + self.rejected_namespace_locked.load(Ordering::Relaxed)
            + self.rejected_build_running.load(Ordering::Relaxed)
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "admitted": {
                "read_only": self.admitted_read_only.load(Ordering::Relaxed),
                "mutating": self.admitted_mutating.load(Ordering::Relaxed),
            },
            "rejected": {
                "no_session": self.rejected_no_session.load(Ordering::Relaxed),
                "user_not_initialized": self.rejected_uninitialized.load(Ordering::Relaxed),
                "no_namespace": self.rejected_no_namespace.load(Ordering::Relaxed),
                "namespace_locked": self.rejected_namespace_locked.load(Ordering::Relaxed),
                "build_running": self.rejected_build_running.load(Ordering::Relaxed),
            },
            "leases": {
                "released": self.leases_released.load(Ordering::Relaxed),
                "outstanding": self.leases_outstanding(),
            },
            "timeouts": self.timeouts.load(Ordering::Relaxed),
            "internal_errors": self.internal_errors.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_counters() {
        let metrics = GatewayMetrics::new();
        metrics.record_admission(RequestKind::ReadOnly);
        metrics.record_admission(RequestKind::Mutating);
        metrics.record_admission(RequestKind::Mutating);
        metrics.record_release();

        assert_eq!(metrics.admitted_read_only.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.admitted_mutating.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.leases_outstanding(), 1);
    }

    #[test]
    fn test_rejection_counters() {
        let metrics = GatewayMetrics::new();
        metrics.record_rejection(Rejection::NamespaceLocked);
        metrics.record_rejection(Rejection::BuildRunning);
        metrics.record_rejection(Rejection::NoSession);

        assert_eq!(metrics.total_rejected(), 3);
        let json = metrics.to_json();
        assert_eq!(json["rejected"]["namespace_locked"], 1);
        assert_eq!(json["rejected"]["build_running"], 1);
        assert_eq!(json["rejected"]["user_not_initialized"], 0);
    }
}
