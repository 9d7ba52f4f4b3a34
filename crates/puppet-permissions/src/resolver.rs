//! The entry point for permission lookups.

use crate::table::{PermissionTable, Resolution};
use crate::types::Permissions;
use std::sync::{Arc, PoisonError, RwLock};

/// Resolves identities against the current permission table.
///
/// The table is held behind a single shared reference. Lookups clone the
/// reference and work on that snapshot; a reload swaps the reference, so a
/// resolution never observes a half-updated table.
pub struct PermissionResolver {
    table: RwLock<Arc<PermissionTable>>,
}

impl PermissionResolver {
    pub fn new(table: PermissionTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// The table currently in effect.
    pub fn table(&self) -> Arc<PermissionTable> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install a new table, returning the one it replaced.
    pub fn replace_table(&self, table: PermissionTable) -> Arc<PermissionTable> {
        let entries = table.len();
        let new = Arc::new(table);
        let mut guard = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let old = std::mem::replace(&mut *guard, new);
        drop(guard);
        tracing::info!(entries, previous = old.len(), "Permission table replaced");
        old
    }

    /// Resolve the permissions of `identity`.
    ///
    /// Never fails: identities that match nothing get no permissions.
    pub fn resolve(&self, identity: &str) -> Permissions {
        self.explain(identity).permissions
    }

    /// Resolve `identity` and report which entry decided it.
    pub fn explain(&self, identity: &str) -> Resolution {
        let table = self.table();
        let resolution = table.resolve(identity);
        tracing::trace!(
            identity,
            level = %resolution.permissions.level,
            matched = ?resolution.matched,
            "Resolved permissions"
        );
        resolution
    }
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new(PermissionTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MatchKind;

    fn resolver(entries: &[(&str, &str)]) -> PermissionResolver {
        PermissionResolver::new(PermissionTable::new(entries.iter().copied()))
    }

    #[test]
    fn test_resolve_uses_table() {
        let r = resolver(&[("alice@h1", "admin"), ("h1", "user"), ("*", "relaybot")]);
        assert!(r.resolve("alice@h1").admin);
        assert_eq!(r.resolve("bob@h1").level, "user");
        assert_eq!(r.resolve("bob@h2").level, "relaybot");
    }

    #[test]
    fn test_default_resolver_grants_nothing() {
        let r = PermissionResolver::default();
        assert_eq!(r.resolve("@a:b"), Permissions::default());
    }

    #[test]
    fn test_replace_table() {
        let r = resolver(&[("*", "relaybot")]);
        assert_eq!(r.resolve("@a:b").level, "relaybot");

        let old = r.replace_table(PermissionTable::new([("b", "admin")]));
        assert_eq!(old.get("*"), Some("relaybot"));
        assert!(r.resolve("@a:b").admin);
        assert_eq!(r.explain("@a:b").matched, MatchKind::Domain("b".into()));
        assert_eq!(r.resolve("@a:c"), Permissions::default());
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let r = resolver(&[("*", "user")]);
        let snapshot = r.table();
        r.replace_table(PermissionTable::default());
        assert_eq!(snapshot.get("*"), Some("user"));
        assert!(r.table().is_empty());
    }

    #[test]
    fn test_concurrent_resolution_sees_whole_tables() {
        let r = Arc::new(resolver(&[("h1", "user"), ("*", "user")]));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let r = Arc::clone(&r);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        // Both tables map every identity to one level, so a
                        // mixed view would show up as a level mismatch.
                        let a = r.table();
                        let p = a.resolve("x@h1").permissions;
                        let q = a.resolve("x@h2").permissions;
                        assert_eq!(p.level, q.level);
                    }
                })
            })
            .collect();

        for i in 0..200 {
            let level = if i % 2 == 0 { "admin" } else { "user" };
            r.replace_table(PermissionTable::new([("h1", level), ("*", level)]));
        }

        for handle in readers {
            handle.join().unwrap();
        }
    }
}
