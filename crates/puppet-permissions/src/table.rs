//! Permission table: identity patterns mapped to level strings.

use crate::types::{PermissionLevel, Permissions};
use std::collections::BTreeMap;

/// Table key that applies to every identity without a more specific entry.
pub const WILDCARD: &str = "*";

/// Which table entry decided a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// The full identity was a key.
    Exact,
    /// The identity's domain was a key.
    Domain(String),
    /// The `*` key applied.
    Wildcard,
    /// Nothing matched.
    Default,
}

/// Result of resolving an identity: the derived permissions plus the entry that decided it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub permissions: Permissions,
    pub matched: MatchKind,
}

/// Immutable mapping from identity, domain or `*` to a level string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    entries: BTreeMap<String, String>,
}

impl PermissionTable {
    /// Build a table from configured entries.
    ///
    /// Unrecognized level strings are kept (they resolve to no permissions)
    /// and reported once here rather than on every lookup.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        for (pattern, level) in &entries {
            if PermissionLevel::from_config(level).is_none() {
                tracing::warn!(
                    pattern = %pattern,
                    level = %level,
                    "Unrecognized permission level, treating as none"
                );
            }
        }

        Self { entries }
    }

    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.entries.get(pattern).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve an identity: exact key, then domain, then `*`, then nothing.
    pub fn resolve(&self, identity: &str) -> Resolution {
        if let Some(level) = self.get(identity) {
            return Resolution {
                permissions: Permissions::from_level(level),
                matched: MatchKind::Exact,
            };
        }

        if let Some(domain) = domain_of(identity)
            && let Some(level) = self.get(domain)
        {
            return Resolution {
                permissions: Permissions::from_level(level),
                matched: MatchKind::Domain(domain.to_string()),
            };
        }

        match self.get(WILDCARD) {
            Some(level) => Resolution {
                permissions: Permissions::from_level(level),
                matched: MatchKind::Wildcard,
            },
            None => Resolution {
                permissions: Permissions::default(),
                matched: MatchKind::Default,
            },
        }
    }
}

/// Extract the domain (homeserver) part of an identity.
///
/// `@local:server` yields everything after the first `:`, so a port stays part
/// of the server name. `local@server` yields everything after the last `@`,
/// port included. Other identities with a `:` yield what follows it.
/// Returns `None` when there is no separator or the domain would be empty.
pub fn domain_of(identity: &str) -> Option<&str> {
    let domain = if let Some(rest) = identity.strip_prefix('@') {
        rest.split_once(':').map(|(_, server)| server)
    } else if let Some((_, server)) = identity.rsplit_once('@') {
        Some(server)
    } else {
        identity.split_once(':').map(|(_, server)| server)
    };
    domain.filter(|d| !d.is_empty())
}
