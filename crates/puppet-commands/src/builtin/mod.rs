//! Built-in bridge commands.

mod conn;
mod help;

pub use conn::{ping_command, set_notice_room_command, sync_command};
pub use help::{help_command, render_help};

use crate::command::CommandSpec;

/// Every built-in command, in registration order.
pub fn all() -> Vec<CommandSpec> {
    vec![
        help_command(),
        set_notice_room_command(),
        ping_command(),
        sync_command(),
    ]
}
