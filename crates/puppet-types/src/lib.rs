//! Shared types, collaborator traits and error hierarchy for Puppet.

pub mod bridge;
pub mod error;
pub mod remote;

pub use bridge::{Bridge, ReplySink};
pub use error::{CommandError, ConfigError, RegistryError};
pub use remote::*;
