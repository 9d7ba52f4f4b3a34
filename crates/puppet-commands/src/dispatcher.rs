//! Gates each command invocation and runs its handler.

use crate::command::CommandContext;
use crate::parse::parse_command;
use crate::registry::CommandRegistry;
use puppet_permissions::PermissionResolver;
use puppet_types::{Bridge, ReplySink};
use std::sync::Arc;

/// Reply sent when the handler failed or panicked.
pub const GENERIC_FAILURE_REPLY: &str = "Unhandled error while handling command";

/// Reply sent when a command needs a logged-in remote account.
pub const NEEDS_AUTH_REPLY: &str = "That command requires you to be logged in.";

/// One incoming command, created per message and dropped after dispatch.
pub struct Invocation {
    pub identity: String,
    pub room: String,
    /// Whether `room` is the caller's management room, as reported by the bridge.
    pub is_management: bool,
    pub command: String,
    pub args: String,
    pub reply: Arc<dyn ReplySink>,
}

/// How a dispatch ended. A reply has been sent in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and returned successfully.
    Completed,
    /// No command by that name or alias.
    UnknownCommand,
    /// The command needs a logged-in remote account.
    AuthRequired,
    /// A management-only command was used outside the management room.
    ScopeViolation,
    /// The handler (or the login check) failed or panicked.
    Failed,
}

/// Routes invocations to registered commands.
///
/// Stateless per invocation: concurrent dispatches share only the read-only
/// registry and the permission resolver.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    permissions: Arc<PermissionResolver>,
    bridge: Arc<dyn Bridge>,
    command_prefix: String,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        permissions: Arc<PermissionResolver>,
        bridge: Arc<dyn Bridge>,
        command_prefix: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            permissions,
            bridge,
            command_prefix: command_prefix.into(),
        }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// The resolver, for inspecting or replacing the permission table.
    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn command_prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse a message body and dispatch it if it is a command.
    ///
    /// Returns `None` for messages that are not commands.
    pub async fn handle_message(
        &self,
        identity: &str,
        room: &str,
        is_management: bool,
        body: &str,
        reply: Arc<dyn ReplySink>,
    ) -> Option<DispatchOutcome> {
        let parsed = parse_command(body, &self.command_prefix, is_management)?;
        let invocation = Invocation {
            identity: identity.to_string(),
            room: room.to_string(),
            is_management,
            command: parsed.command,
            args: parsed.args,
            reply,
        };
        Some(self.dispatch(invocation).await)
    }

    /// Dispatch on the tokio runtime without waiting for the result.
    pub fn spawn_dispatch(
        self: &Arc<Self>,
        invocation: Invocation,
    ) -> tokio::task::JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(invocation).await })
    }

    /// Gate and run one invocation.
    ///
    /// Gates, in order: the command must exist, the caller must be logged in
    /// if the command needs it, and management-only commands must come from
    /// the management room. Every failure, including a panic in the handler,
    /// ends here as a reply to the caller.
    pub async fn dispatch(&self, invocation: Invocation) -> DispatchOutcome {
        let Some(spec) = self.registry.lookup(&invocation.command) else {
            tracing::debug!(
                identity = %invocation.identity,
                command = %invocation.command,
                "Unknown command"
            );
            let text = format!(
                "Unknown command. Try `{} help` for help.",
                self.command_prefix
            );
            self.send_reply(&invocation, &text).await;
            return DispatchOutcome::UnknownCommand;
        };

        let permissions = self.permissions.resolve(&invocation.identity);

        if spec.needs_auth {
            match self.bridge.is_logged_in(&invocation.identity).await {
                Ok(true) => {}
                Ok(false) => {
                    self.send_reply(&invocation, NEEDS_AUTH_REPLY).await;
                    return DispatchOutcome::AuthRequired;
                }
                Err(e) => {
                    tracing::error!(
                        identity = %invocation.identity,
                        command = %spec.name,
                        error = %e,
                        "Login check failed"
                    );
                    self.send_reply(&invocation, GENERIC_FAILURE_REPLY).await;
                    return DispatchOutcome::Failed;
                }
            }
        }

        if spec.management_only && !invocation.is_management {
            let text = format!(
                "`{}` is a restricted command: you may only run it in management rooms.",
                spec.name
            );
            self.send_reply(&invocation, &text).await;
            return DispatchOutcome::ScopeViolation;
        }

        tracing::info!(
            identity = %invocation.identity,
            command = %spec.name,
            room = %invocation.room,
            level = %permissions.level,
            "Running command"
        );

        let ctx = CommandContext {
            identity: invocation.identity.clone(),
            room: invocation.room.clone(),
            is_management: invocation.is_management,
            permissions,
            command: spec.name.clone(),
            args: invocation.args.clone(),
            command_prefix: self.command_prefix.clone(),
            bridge: Arc::clone(&self.bridge),
            registry: Arc::clone(&self.registry),
            reply: Arc::clone(&invocation.reply),
        };

        // Run the handler in its own task so a panic stays inside this invocation
        match tokio::spawn(spec.call(ctx)).await {
            Ok(Ok(())) => DispatchOutcome::Completed,
            Ok(Err(e)) => {
                tracing::error!(
                    identity = %invocation.identity,
                    command = %spec.name,
                    error = %e,
                    "Command failed"
                );
                self.send_reply(&invocation, GENERIC_FAILURE_REPLY).await;
                DispatchOutcome::Failed
            }
            Err(e) => {
                tracing::error!(
                    identity = %invocation.identity,
                    command = %spec.name,
                    error = %e,
                    "Command handler panicked"
                );
                self.send_reply(&invocation, GENERIC_FAILURE_REPLY).await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn send_reply(&self, invocation: &Invocation, text: &str) {
        if let Err(e) = invocation.reply.send(&invocation.room, text).await {
            tracing::warn!(
                identity = %invocation.identity,
                room = %invocation.room,
                error = %e,
                "Failed to send reply"
            );
        }
    }
}
