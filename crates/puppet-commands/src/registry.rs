//! Command registry for name-based dispatch.

use crate::command::{CommandSpec, HelpSection};
use puppet_types::RegistryError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available commands, keyed by lowercased name and alias.
///
/// Built once at startup and read-only afterwards.
pub struct CommandRegistry {
    commands: Vec<Arc<CommandSpec>>,
    by_name: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with all built-in commands.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for spec in crate::builtin::all() {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Register a command.
    ///
    /// Names and aliases share one case-insensitive namespace; a clash is a
    /// startup error and leaves the registry unchanged.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        let mut keys: Vec<String> = Vec::with_capacity(1 + spec.aliases.len());
        for key in std::iter::once(&spec.name).chain(&spec.aliases) {
            let key = key.to_lowercase();
            if self.by_name.contains_key(&key) || keys.contains(&key) {
                return Err(RegistryError::Duplicate { name: key });
            }
            keys.push(key);
        }

        let index = self.commands.len();
        for key in keys {
            self.by_name.insert(key, index);
        }
        tracing::debug!(command = %spec.name, "Registered command");
        self.commands.push(Arc::new(spec));
        Ok(())
    }

    /// Find a command by name or alias, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<Arc<CommandSpec>> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| Arc::clone(&self.commands[i]))
    }

    /// Check if a command exists by name or alias.
    pub fn has_command(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// Commands grouped by help section.
    ///
    /// Sections are sorted by their order weight (ties by first registration);
    /// commands keep registration order within a section.
    pub fn sections(&self) -> Vec<(HelpSection, Vec<Arc<CommandSpec>>)> {
        let mut sections: Vec<(HelpSection, Vec<Arc<CommandSpec>>)> = Vec::new();
        for spec in &self.commands {
            match sections.iter_mut().find(|(s, _)| *s == spec.section) {
                Some((_, specs)) => specs.push(Arc::clone(spec)),
                None => sections.push((spec.section, vec![Arc::clone(spec)])),
            }
        }
        // Stable sort keeps first-registration order for equal weights
        sections.sort_by_key(|(s, _)| s.order);
        sections
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandContext, SECTION_CONNECTION, SECTION_GENERAL};
    use puppet_types::CommandError;

    async fn noop(_ctx: CommandContext) -> Result<(), CommandError> {
        Ok(())
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("ping", noop)).unwrap();
        assert!(registry.lookup("PING").is_some());
        assert!(registry.lookup("Ping").is_some());
        assert!(registry.lookup("pong").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("sync", noop)).unwrap();
        let err = registry.register(CommandSpec::new("SYNC", noop)).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate { name: "sync".into() });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_alias_clash_rejected_atomically() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("ping", noop)).unwrap();
        let err = registry
            .register(CommandSpec::new("status", noop).alias("ping"))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate { name: "ping".into() });
        assert!(!registry.has_command("status"));
    }

    #[test]
    fn test_alias_equal_to_own_name_rejected() {
        let mut registry = CommandRegistry::new();
        assert!(
            registry
                .register(CommandSpec::new("help", noop).alias("HELP"))
                .is_err()
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_alias_resolves_to_spec() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec::new("set-notice-room", noop).alias("mark-notice-room"))
            .unwrap();
        let spec = registry.lookup("mark-notice-room").unwrap();
        assert_eq!(spec.name, "set-notice-room");
    }

    #[test]
    fn test_sections_grouped_in_order() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec::new("ping", noop).section(SECTION_CONNECTION))
            .unwrap();
        registry
            .register(CommandSpec::new("help", noop).section(SECTION_GENERAL))
            .unwrap();
        registry
            .register(CommandSpec::new("sync", noop).section(SECTION_CONNECTION))
            .unwrap();

        let sections = registry.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, SECTION_GENERAL);
        let names: Vec<&str> = sections[1].1.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "sync"]);
    }

    #[test]
    fn test_builtins_register() {
        let registry = CommandRegistry::with_builtins().unwrap();
        for name in ["help", "set-notice-room", "mark-notice-room", "ping", "sync"] {
            assert!(registry.has_command(name), "missing {name}");
        }
        assert_eq!(registry.len(), 4);
    }
}
