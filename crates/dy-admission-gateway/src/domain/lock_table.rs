//! Namespace lock table.
//!
//! Process-local map from namespace to a "mutation in progress" flag. Busy
//! namespaces are refused, never queued, so there is no waiter bookkeeping and
//! no chained waits. Entries are created lazily and only ever reset to
//! `false`; the table grows with the number of distinct namespaces seen.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-namespace mutual exclusion for mutating requests
#[derive(Debug, Default)]
pub struct NamespaceLockTable {
    flags: DashMap<String, bool>,
}

impl NamespaceLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the current flag without changing it
    pub fn is_locked(&self, namespace: &str) -> bool {
        self.flags.get(namespace).map(|flag| *flag).unwrap_or(false)
    }

    /// Set the flag if it is clear.
    ///
    /// The read and the write happen under the same shard guard, so two
    /// callers can never both observe `false` for the same namespace.
    pub fn try_acquire(&self, namespace: &str) -> bool {
        let mut flag = self.flags.entry(namespace.to_string()).or_insert(false);
        if *flag {
            return false;
        }
        *flag = true;
        debug!(namespace, "Namespace locked");
        true
    }

    /// Clear the flag. Idempotent; unknown namespaces are a no-op.
    pub fn release(&self, namespace: &str) {
        if let Some(mut flag) = self.flags.get_mut(namespace) {
            if *flag {
                debug!(namespace, "Namespace unlocked");
            }
            *flag = false;
        }
    }

    /// Scoped acquire: the returned lease releases the namespace when dropped.
    pub fn try_lease(self: &Arc<Self>, namespace: &str) -> Option<NamespaceLease> {
        if self.try_acquire(namespace) {
            Some(NamespaceLease {
                table: Arc::clone(self),
                namespace: namespace.to_string(),
            })
        } else {
            None
        }
    }

    /// Namespaces currently held, sorted
    pub fn locked_namespaces(&self) -> Vec<String> {
        let mut held: Vec<String> = self
            .flags
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| entry.key().clone())
            .collect();
        held.sort();
        held
    }

    /// Number of namespaces ever seen
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Held lock on one namespace. Released exactly once, on drop.
#[must_use = "dropping the lease releases the namespace immediately"]
pub struct NamespaceLease {
    table: Arc<NamespaceLockTable>,
    namespace: String,
}

impl NamespaceLease {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Debug for NamespaceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceLease")
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl Drop for NamespaceLease {
    fn drop(&mut self) {
        self.table.release(&self.namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_acquire_then_conflict() {
        let table = NamespaceLockTable::new();
        assert!(!table.is_locked("acme"));
        assert!(table.try_acquire("acme"));
        assert!(table.is_locked("acme"));
        assert!(!table.try_acquire("acme"));
        assert!(table.is_locked("acme"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let table = NamespaceLockTable::new();
        assert!(table.try_acquire("acme"));
        assert!(table.try_acquire("globex"));
        assert_eq!(table.locked_namespaces(), vec!["acme", "globex"]);
    }

    #[test]
    fn test_release_is_idempotent() {
        let table = NamespaceLockTable::new();
        table.release("never-seen");
        assert!(table.is_empty());

        assert!(table.try_acquire("acme"));
        table.release("acme");
        table.release("acme");
        assert!(!table.is_locked("acme"));
        assert!(table.try_acquire("acme"));
    }

    #[test]
    fn test_entries_are_kept_after_release() {
        let table = NamespaceLockTable::new();
        assert!(table.try_acquire("acme"));
        table.release("acme");
        assert_eq!(table.len(), 1);
        assert!(table.locked_namespaces().is_empty());
    }

    #[test]
    fn test_shared_table_can_be_published_once() {
        let table = Arc::new(NamespaceLockTable::new());
        let cell = std::sync::OnceLock::new();
        cell.set(Arc::clone(&table)).expect("first set succeeds");

        let rejected = cell.set(Arc::new(NamespaceLockTable::new())).unwrap_err();
        assert!(format!("{:?}", rejected).starts_with("NamespaceLockTable"));
        assert!(Arc::ptr_eq(cell.get().unwrap(), &table));
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let table = Arc::new(NamespaceLockTable::new());
        let lease = table.try_lease("acme").unwrap();
        assert_eq!(lease.namespace(), "acme");
        assert!(table.try_lease("acme").is_none());

        drop(lease);
        assert!(!table.is_locked("acme"));
        assert!(table.try_lease("acme").is_some());
    }

    #[test]
    fn test_concurrent_acquire_has_single_winner() {
        let table = Arc::new(NamespaceLockTable::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || table.try_acquire("acme"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    proptest! {
        #[test]
        fn prop_matches_reference_model(
            ops in proptest::collection::vec((any::<bool>(), 0usize..4), 0..64)
        ) {
            let names = ["a", "b", "c", "d"];
            let table = NamespaceLockTable::new();
            let mut model: HashMap<&str, bool> = HashMap::new();

            for (acquire, idx) in ops {
                let ns = names[idx];
                if acquire {
                    let expected = !model.get(ns).copied().unwrap_or(false);
                    prop_assert_eq!(table.try_acquire(ns), expected);
                    model.insert(ns, true);
                } else {
                    table.release(ns);
                    if model.contains_key(ns) {
                        model.insert(ns, false);
                    }
                }
                for name in names {
                    prop_assert_eq!(table.is_locked(name), model.get(name).copied().unwrap_or(false));
                }
            }
        }
    }
}
