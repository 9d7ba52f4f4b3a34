//! The `help` command.

use crate::command::{CommandContext, CommandSpec, SECTION_GENERAL};
use crate::registry::CommandRegistry;
use puppet_types::CommandError;
use std::fmt::Write;

pub fn help_command() -> CommandSpec {
    CommandSpec::new("help", help)
        .needs_auth(false)
        .section(SECTION_GENERAL)
        .help_text("Show this help message")
}

async fn help(ctx: CommandContext) -> Result<(), CommandError> {
    let text = render_help(&ctx.registry, ctx.is_management, &ctx.command_prefix);
    ctx.reply(&text).await
}

/// Markdown listing of the commands usable from the current room.
///
/// Management-only commands are left out unless `is_management` is set.
pub fn render_help(registry: &CommandRegistry, is_management: bool, prefix: &str) -> String {
    let mut out = String::new();
    if is_management {
        let _ = writeln!(
            out,
            "This is a management room: prefixing commands with `{prefix}` is not required."
        );
    } else {
        let _ = writeln!(out, "**Usage:** `{prefix} <command> [arguments]`");
    }

    for (section, specs) in registry.sections() {
        let visible: Vec<_> = specs
            .iter()
            .filter(|spec| is_management || !spec.management_only)
            .collect();
        if visible.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n#### {}", section.name);
        for spec in visible {
            let args = spec
                .help_args
                .as_deref()
                .map(|a| format!(" {a}"))
                .unwrap_or_default();
            let _ = writeln!(out, "**{}**{} - {}", spec.name, args, spec.help_text);
        }
    }
    out.trim_end().to_string()
}
