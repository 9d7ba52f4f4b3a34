//! Command descriptors and the context handed to command handlers.

use crate::registry::CommandRegistry;
use puppet_permissions::Permissions;
use puppet_types::{Bridge, CommandError, ReplySink};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by command handlers.
pub type CommandFuture = Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send>>;

/// Type-erased command handler.
pub type CommandHandler = Arc<dyn Fn(CommandContext) -> CommandFuture + Send + Sync>;

/// A heading in the help listing. Sections are shown in ascending `order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HelpSection {
    pub name: &'static str,
    pub order: i32,
}

pub const SECTION_GENERAL: HelpSection = HelpSection {
    name: "General",
    order: 0,
};

pub const SECTION_CONNECTION: HelpSection = HelpSection {
    name: "Connection management",
    order: 15,
};

/// Everything a handler needs to serve one invocation.
pub struct CommandContext {
    pub identity: String,
    pub room: String,
    /// Whether `room` is the caller's management room.
    pub is_management: bool,
    pub permissions: Permissions,
    /// The canonical command name (not the alias that was typed).
    pub command: String,
    pub args: String,
    pub command_prefix: String,
    pub bridge: Arc<dyn Bridge>,
    pub registry: Arc<CommandRegistry>,
    pub(crate) reply: Arc<dyn ReplySink>,
}

impl CommandContext {
    /// Send a markdown reply to the room the command came from.
    pub async fn reply(&self, text: &str) -> Result<(), CommandError> {
        self.reply.send(&self.room, text).await
    }
}

/// Static description of a command: its name, gates, help and handler.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub aliases: Vec<String>,
    /// Caller must be logged into the remote account.
    pub needs_auth: bool,
    /// Command may only be run from the caller's management room.
    pub management_only: bool,
    pub section: HelpSection,
    pub help_text: String,
    pub help_args: Option<String>,
    handler: CommandHandler,
}

impl CommandSpec {
    /// Create a spec with the default gates: login required, usable in any room.
    pub fn new<F, Fut>(name: &str, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
    {
        Self {
            name: name.to_lowercase(),
            aliases: Vec::new(),
            needs_auth: true,
            management_only: false,
            section: SECTION_GENERAL,
            help_text: String::new(),
            help_args: None,
            handler: Arc::new(move |ctx: CommandContext| -> CommandFuture {
                Box::pin(handler(ctx))
            }),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    pub fn needs_auth(mut self, needs_auth: bool) -> Self {
        self.needs_auth = needs_auth;
        self
    }

    pub fn management_only(mut self, management_only: bool) -> Self {
        self.management_only = management_only;
        self
    }

    pub fn section(mut self, section: HelpSection) -> Self {
        self.section = section;
        self
    }

    pub fn help_text(mut self, text: &str) -> Self {
        self.help_text = text.to_string();
        self
    }

    pub fn help_args(mut self, args: &str) -> Self {
        self.help_args = Some(args.to_string());
        self
    }

    /// Start the handler for one invocation.
    pub fn call(&self, ctx: CommandContext) -> CommandFuture {
        (self.handler)(ctx)
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("needs_auth", &self.needs_auth)
            .field("management_only", &self.management_only)
            .field("section", &self.section.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ctx: CommandContext) -> Result<(), CommandError> {
        Ok(())
    }

    #[test]
    fn test_defaults_require_auth_anywhere() {
        let spec = CommandSpec::new("Login", noop);
        assert_eq!(spec.name, "login");
        assert!(spec.needs_auth);
        assert!(!spec.management_only);
        assert_eq!(spec.section, SECTION_GENERAL);
        assert!(spec.aliases.is_empty());
    }

    #[test]
    fn test_builder() {
        let spec = CommandSpec::new("set-notice-room", noop)
            .alias("Mark-Notice-Room")
            .needs_auth(false)
            .management_only(true)
            .section(SECTION_CONNECTION)
            .help_text("Mark this room")
            .help_args("<room>");
        assert_eq!(spec.aliases, vec!["mark-notice-room"]);
        assert!(!spec.needs_auth);
        assert!(spec.management_only);
        assert_eq!(spec.section.order, 15);
        assert_eq!(spec.help_args.as_deref(), Some("<room>"));
        assert!(format!("{spec:?}").contains("set-notice-room"));
    }
}
