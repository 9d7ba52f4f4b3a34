//! Error hierarchy for Puppet.

use thiserror::Error;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Forbidden configuration value for '{key}': {message}")]
    ForbiddenValue { key: String, message: String },
}

/// Errors raised while building the command registry.
///
/// These only occur during startup and abort initialization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{name}' is already registered")]
    Duplicate { name: String },
}

/// Errors from command handlers and the collaborators they call.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not logged in to the remote account")]
    NotLoggedIn,

    #[error("Remote account error: {0}")]
    Remote(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to send reply: {0}")]
    Reply(String),
}
