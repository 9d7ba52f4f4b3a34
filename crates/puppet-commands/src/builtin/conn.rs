//! Connection management commands.

use crate::command::{CommandContext, CommandSpec, SECTION_CONNECTION};
use puppet_types::CommandError;

pub fn set_notice_room_command() -> CommandSpec {
    CommandSpec::new("set-notice-room", set_notice_room)
        .alias("mark-notice-room")
        .needs_auth(false)
        .management_only(true)
        .section(SECTION_CONNECTION)
        .help_text("Mark this room as your bridge notice room")
}

pub fn ping_command() -> CommandSpec {
    CommandSpec::new("ping", ping)
        .needs_auth(false)
        .management_only(true)
        .section(SECTION_CONNECTION)
        .help_text("Check if you're logged into Twitter")
}

pub fn sync_command() -> CommandSpec {
    CommandSpec::new("sync", sync)
        .needs_auth(true)
        .management_only(false)
        .section(SECTION_CONNECTION)
        .help_text("Synchronize portals")
}

async fn set_notice_room(ctx: CommandContext) -> Result<(), CommandError> {
    ctx.bridge.set_notice_room(&ctx.identity, &ctx.room).await?;
    ctx.reply("This room has been marked as your bridge notice room")
        .await
}

async fn ping(ctx: CommandContext) -> Result<(), CommandError> {
    if !ctx.bridge.is_logged_in(&ctx.identity).await? {
        return ctx.reply("You're not logged into Twitter").await;
    }
    let info = ctx.bridge.account_info(&ctx.identity).await?;
    ctx.reply(&format!(
        "You're logged in as {} ([@{}](https://twitter.com/{}), user ID: {})",
        info.name, info.username, info.username, info.id
    ))
    .await
}

/// Refresh conversation state without replaying messages.
///
/// The regular poller keeps running during a resync, so message entries are
/// dropped before the state is handed to the bridge.
async fn sync(ctx: CommandContext) -> Result<(), CommandError> {
    let snapshot = ctx.bridge.inbox_initial_state(&ctx.identity).await?;
    tracing::debug!(
        identity = %ctx.identity,
        conversations = snapshot.conversations.len(),
        dropped_entries = snapshot.entries.len(),
        "Resyncing inbox state"
    );
    ctx.bridge
        .dispatch_all(&ctx.identity, snapshot.without_entries())
        .await?;
    ctx.reply("Synchronization complete").await
}
