//! Layered TOML configuration for Puppet.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

pub mod store;

pub use store::{ConfigStore, ENV_PREFIX, env_key};

use puppet_permissions::PermissionTable;
use puppet_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The default prefix for bridge commands in non-management rooms.
pub const DEFAULT_COMMAND_PREFIX: &str = "!tw";

/// Config file used when neither `--config` nor `PUPPET_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Permission keys from the sample config that must be edited before use.
const FORBIDDEN_PERMISSION_KEYS: &[&str] = &["example.com"];

/// Built-in defaults, the lowest configuration tier.
pub const DEFAULT_CONFIG: &str = r#"
[bridge]
username_template = "twitter_{userid}"
displayname_template = "{displayname} (Twitter)"
displayname_max_length = 100
sync_conversation_limit = 10
delivery_receipts = false
command_prefix = "!tw"

[bridge.permissions]
"*" = "relaybot"
"#;

/// Resolved configuration for a bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub command_prefix: String,
    pub permissions: PermissionTable,
    pub username_template: String,
    pub displayname_template: String,
    pub displayname_max_length: usize,
    pub sync_conversation_limit: usize,
    pub delivery_receipts: bool,
    /// The file the configuration was read from, if it existed.
    pub config_path: Option<PathBuf>,
    /// The file chosen by path precedence, whether or not it existed.
    /// Reloads read from here.
    pub source_path: PathBuf,
    /// The full resolved tree, for keys without a typed field.
    pub store: ConfigStore,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub bridge: BridgeSettings,
}

/// The `[bridge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default)]
    pub permissions: BTreeMap<String, String>,
    #[serde(default = "default_username_template")]
    pub username_template: String,
    #[serde(default = "default_displayname_template")]
    pub displayname_template: String,
    #[serde(default = "default_displayname_max_length")]
    pub displayname_max_length: usize,
    #[serde(default = "default_sync_conversation_limit")]
    pub sync_conversation_limit: usize,
    #[serde(default)]
    pub delivery_receipts: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            permissions: BTreeMap::new(),
            username_template: default_username_template(),
            displayname_template: default_displayname_template(),
            displayname_max_length: default_displayname_max_length(),
            sync_conversation_limit: default_sync_conversation_limit(),
            delivery_receipts: false,
        }
    }
}

fn default_command_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

fn default_username_template() -> String {
    "twitter_{userid}".to_string()
}

fn default_displayname_template() -> String {
    "{displayname} (Twitter)".to_string()
}

fn default_displayname_max_length() -> usize {
    100
}

fn default_sync_conversation_limit() -> usize {
    10
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub command_prefix: Option<String>,
}

impl BridgeConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables (`PUPPET_<DOTTED_KEY>`)
    /// 3. Config file (`--config`, `PUPPET_CONFIG`, or ./config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let path = overrides
            .config_path
            .clone()
            .or_else(|| std::env::var(format!("{ENV_PREFIX}_CONFIG")).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let file = load_settings_file(&path)?;
        let config_path = file.as_ref().map(|_| path.clone());
        let store = ConfigStore::resolve(default_table()?, file, &|k: &str| std::env::var(k).ok())?;

        let mut config = Self::from_store(store)?;
        config.config_path = config_path;
        config.source_path = path;
        if let Some(prefix) = overrides.command_prefix {
            validate_prefix(&prefix)?;
            config.command_prefix = prefix;
        }
        Ok(config)
    }

    /// Build the typed view of a resolved store and validate it.
    pub fn from_store(store: ConfigStore) -> Result<Self, ConfigError> {
        let settings: SettingsFile = toml::Value::Table(store.root().clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::InvalidValue {
                key: "bridge".into(),
                message: e.to_string(),
            })?;
        let bridge = settings.bridge;

        for key in FORBIDDEN_PERMISSION_KEYS {
            if bridge.permissions.contains_key(*key) {
                return Err(ConfigError::ForbiddenValue {
                    key: "bridge.permissions".into(),
                    message: format!("the sample entry '{key}' must be replaced with your own server"),
                });
            }
        }

        validate_prefix(&bridge.command_prefix)?;

        Ok(Self {
            command_prefix: bridge.command_prefix,
            permissions: PermissionTable::new(bridge.permissions),
            username_template: bridge.username_template,
            displayname_template: bridge.displayname_template,
            displayname_max_length: bridge.displayname_max_length,
            sync_conversation_limit: bridge.sync_conversation_limit,
            delivery_receipts: bridge.delivery_receipts,
            config_path: None,
            source_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            store,
        })
    }

    /// Re-read only the permission table, for reloads.
    ///
    /// Reads the same file `load` chose, even if it was created since, and
    /// applies environment overrides again.
    pub fn reload_permissions(&self) -> Result<PermissionTable, ConfigError> {
        let reloaded = Self::load(CliOverrides {
            config_path: Some(self.source_path.clone()),
            command_prefix: None,
        })?;
        Ok(reloaded.permissions)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "bridge.command_prefix".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

/// The built-in defaults as a TOML table.
pub fn default_table() -> Result<toml::Table, ConfigError> {
    toml::from_str(DEFAULT_CONFIG).map_err(|e: toml::de::Error| ConfigError::Parse {
        path: "<defaults>".into(),
        message: e.to_string(),
    })
}

/// Read and parse a TOML config file.
///
/// A missing file is not an error (defaults apply); an unreadable or
/// malformed one is, since a broken permission table must not start a bridge.
pub fn load_settings_file(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}
