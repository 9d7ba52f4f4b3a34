//! Layered key-value store: defaults, then the config file, then environment overrides.
//!
//! Everything is resolved once when the store is built. After that the store
//! is plain immutable data; lookups never consult the environment again.

use puppet_types::ConfigError;
use toml::{Table, Value};

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "PUPPET";

/// Tables that a config file replaces wholesale instead of merging into the defaults.
const REPLACED_TABLES: &[&str] = &["bridge.permissions"];

/// Environment variable name that overrides a dotted key.
///
/// `bridge.command_prefix` becomes `PUPPET_BRIDGE_COMMAND_PREFIX`.
pub fn env_key(dotted: &str) -> String {
    format!("{ENV_PREFIX}_{}", dotted.replace('.', "_").to_uppercase())
}

/// Fully resolved configuration tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    root: Table,
}

impl ConfigStore {
    /// Merge `file` over `defaults`, then apply environment overrides.
    ///
    /// `env` looks up a variable by name; pass `|k| std::env::var(k).ok()` for
    /// the process environment. Every key present after the merge can be
    /// overridden, tables included. Scalar overrides are coerced to the type of
    /// the value they replace; arrays and tables take a JSON document.
    pub fn resolve(
        defaults: Table,
        file: Option<Table>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut root = defaults;
        if let Some(file) = file {
            merge(&mut root, file, "");
        }
        apply_env(&mut root, "", env)?;
        Ok(Self { root })
    }

    /// Look up a value by dotted key.
    ///
    /// Keys that themselves contain dots (domains in the permission table)
    /// are reachable only through their parent table.
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut parts = dotted.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    pub fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Value::as_str)
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    /// Render the resolved tree back to TOML.
    pub fn render(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.root).map_err(|e| ConfigError::InvalidValue {
            key: "<root>".into(),
            message: e.to_string(),
        })
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn merge(base: &mut Table, overlay: Table, prefix: &str) {
    for (key, value) in overlay {
        let dotted = join(prefix, &key);
        if let Value::Table(incoming) = value {
            if !REPLACED_TABLES.contains(&dotted.as_str()) {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge(existing, incoming, &dotted);
                    continue;
                }
            }
            base.insert(key, Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

fn apply_env(
    table: &mut Table,
    prefix: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    for (key, value) in table.iter_mut() {
        let dotted = join(prefix, key);
        if let Some(raw) = env(&env_key(&dotted)) {
            *value = coerce(&dotted, value, &raw)?;
            tracing::debug!(key = %dotted, "Configuration value overridden from environment");
            continue;
        }
        if let Value::Table(child) = value {
            apply_env(child, &dotted, env)?;
        }
    }
    Ok(())
}

fn coerce(key: &str, current: &Value, raw: &str) -> Result<Value, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let value = match current {
        Value::String(_) => Value::String(raw.to_string()),
        Value::Integer(_) => Value::Integer(
            raw.trim()
                .parse()
                .map_err(|e| invalid(format!("expected an integer: {e}")))?,
        ),
        Value::Float(_) => Value::Float(
            raw.trim()
                .parse()
                .map_err(|e| invalid(format!("expected a number: {e}")))?,
        ),
        Value::Boolean(_) => Value::Boolean(
            raw.trim()
                .to_ascii_lowercase()
                .parse()
                .map_err(|e| invalid(format!("expected true or false: {e}")))?,
        ),
        Value::Datetime(_) => Value::Datetime(
            raw.trim()
                .parse()
                .map_err(|e| invalid(format!("expected a datetime: {e}")))?,
        ),
        Value::Array(_) | Value::Table(_) => {
            let json: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| invalid(format!("expected a JSON document: {e}")))?;
            let parsed = Value::try_from(json).map_err(|e| invalid(e.to_string()))?;
            if std::mem::discriminant(&parsed) != std::mem::discriminant(current) {
                return Err(invalid(format!("expected a JSON {}", current.type_str())));
            }
            parsed
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(s: &str) -> Table {
        toml::from_str(s).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const DEFAULTS: &str = r#"
[bridge]
command_prefix = "!tw"
displayname_max_length = 100
delivery_receipts = false

[bridge.permissions]
"*" = "relaybot"
"#;

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("bridge.command_prefix"), "PUPPET_BRIDGE_COMMAND_PREFIX");
        assert_eq!(env_key("bridge.permissions"), "PUPPET_BRIDGE_PERMISSIONS");
    }

    #[test]
    fn test_defaults_only() {
        let store = ConfigStore::resolve(table(DEFAULTS), None, &no_env).unwrap();
        assert_eq!(store.get_str("bridge.command_prefix"), Some("!tw"));
        assert_eq!(
            store.get("bridge.displayname_max_length").and_then(Value::as_integer),
            Some(100)
        );
        assert!(store.get("bridge.missing").is_none());
        assert!(store.get("nope.nested").is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = table(
            r#"
[bridge]
command_prefix = "!twitter"
"#,
        );
        let store = ConfigStore::resolve(table(DEFAULTS), Some(file), &no_env).unwrap();
        assert_eq!(store.get_str("bridge.command_prefix"), Some("!twitter"));
        // Sibling keys survive the merge
        assert_eq!(
            store.get("bridge.delivery_receipts").and_then(Value::as_bool),
            Some(false)
        );
    }

    #[test]
    fn test_file_permissions_replace_defaults() {
        let file = table(
            r#"
[bridge.permissions]
"example.org" = "user"
"#,
        );
        let store = ConfigStore::resolve(table(DEFAULTS), Some(file), &no_env).unwrap();
        let perms = store.get("bridge.permissions").and_then(Value::as_table).unwrap();
        assert_eq!(perms.len(), 1);
        assert!(perms.get("*").is_none());
        assert_eq!(perms.get("example.org").and_then(Value::as_str), Some("user"));
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = table(
            r#"
[bridge]
command_prefix = "!file"
"#,
        );
        let env = |k: &str| (k == "PUPPET_BRIDGE_COMMAND_PREFIX").then(|| "!env".to_string());
        let store = ConfigStore::resolve(table(DEFAULTS), Some(file), &env).unwrap();
        assert_eq!(store.get_str("bridge.command_prefix"), Some("!env"));
    }

    #[test]
    fn test_env_coerces_scalars() {
        let vars: HashMap<&str, &str> = [
            ("PUPPET_BRIDGE_DISPLAYNAME_MAX_LENGTH", " 42 "),
            ("PUPPET_BRIDGE_DELIVERY_RECEIPTS", "TRUE"),
        ]
        .into_iter()
        .collect();
        let env = |k: &str| vars.get(k).map(|v| v.to_string());
        let store = ConfigStore::resolve(table(DEFAULTS), None, &env).unwrap();
        assert_eq!(
            store.get("bridge.displayname_max_length").and_then(Value::as_integer),
            Some(42)
        );
        assert_eq!(
            store.get("bridge.delivery_receipts").and_then(Value::as_bool),
            Some(true)
        );
    }

    #[test]
    fn test_env_bad_integer_is_invalid() {
        let env = |k: &str| (k == "PUPPET_BRIDGE_DISPLAYNAME_MAX_LENGTH").then(|| "lots".to_string());
        let err = ConfigStore::resolve(table(DEFAULTS), None, &env).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "bridge.displayname_max_length"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_replaces_permission_table_with_json() {
        let env = |k: &str| {
            (k == "PUPPET_BRIDGE_PERMISSIONS")
                .then(|| r#"{"@admin:example.org": "admin", "*": "user"}"#.to_string())
        };
        let store = ConfigStore::resolve(table(DEFAULTS), None, &env).unwrap();
        let perms = store.get("bridge.permissions").and_then(Value::as_table).unwrap();
        assert_eq!(perms.len(), 2);
        assert_eq!(perms.get("*").and_then(Value::as_str), Some("user"));
        assert_eq!(
            perms.get("@admin:example.org").and_then(Value::as_str),
            Some("admin")
        );
    }

    #[test]
    fn test_env_table_override_must_be_object() {
        let env = |k: &str| (k == "PUPPET_BRIDGE_PERMISSIONS").then(|| "[1, 2]".to_string());
        assert!(matches!(
            ConfigStore::resolve(table(DEFAULTS), None, &env),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_render_roundtrips() {
        let store = ConfigStore::resolve(table(DEFAULTS), None, &no_env).unwrap();
        let rendered = store.render().unwrap();
        let reparsed = ConfigStore::resolve(table(&rendered), None, &no_env).unwrap();
        assert_eq!(store, reparsed);
    }
}
