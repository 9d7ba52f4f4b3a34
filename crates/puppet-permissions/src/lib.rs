//! Permission levels and identity resolution for Puppet.
//!
//! Levels: none < relaybot < user < puppeting < matrix_puppeting < admin
//! Lookup order: exact identity > domain > `*`

pub mod resolver;
pub mod table;
pub mod types;

pub use resolver::PermissionResolver;
pub use table::{MatchKind, PermissionTable, Resolution, WILDCARD, domain_of};
pub use types::*;
