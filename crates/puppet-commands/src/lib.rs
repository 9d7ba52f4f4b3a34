//! Command registry, dispatcher and built-in bridge commands for Puppet.
//!
//! Dispatch gates: known command > logged in (`needs_auth`) > management room (`management_only`)

pub mod builtin;
mod command;
mod dispatcher;
mod parse;
mod registry;

pub use command::{
    CommandContext, CommandFuture, CommandHandler, CommandSpec, HelpSection, SECTION_CONNECTION,
    SECTION_GENERAL,
};
pub use dispatcher::{
    DispatchOutcome, Dispatcher, GENERIC_FAILURE_REPLY, Invocation, NEEDS_AUTH_REPLY,
};
pub use parse::{ParsedCommand, parse_command};
pub use registry::CommandRegistry;
