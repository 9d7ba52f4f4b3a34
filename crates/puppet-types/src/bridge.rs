//! Collaborator traits the command layer talks to.
//!
//! The bridge owns the remote account clients, the user store and the room
//! transport. Commands only see them through these traits.

use crate::{AccountInfo, CommandError, InboxSnapshot};
use std::future::Future;
use std::pin::Pin;

/// Per-identity access to remote accounts and persisted user records.
///
/// Dyn-compatible so the dispatcher can hold an `Arc<dyn Bridge>`.
pub trait Bridge: Send + Sync {
    /// Whether `identity` has a live, authenticated remote session.
    fn is_logged_in<'a>(
        &'a self,
        identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, CommandError>> + Send + 'a>>;

    /// Fetch the profile of the remote account `identity` is logged into.
    fn account_info<'a>(
        &'a self,
        identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AccountInfo, CommandError>> + Send + 'a>>;

    /// Persist `room` as the sink for this identity's bridge notices.
    fn set_notice_room<'a>(
        &'a self,
        identity: &'a str,
        room: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>>;

    /// Fetch the full inbox state for the identity's remote account.
    fn inbox_initial_state<'a>(
        &'a self,
        identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<InboxSnapshot, CommandError>> + Send + 'a>>;

    /// Hand a snapshot to the bridge, creating or updating portals for it.
    fn dispatch_all<'a>(
        &'a self,
        identity: &'a str,
        snapshot: InboxSnapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>>;
}

/// Sends markdown replies back into a room.
pub trait ReplySink: Send + Sync {
    fn send<'a>(
        &'a self,
        room: &'a str,
        markdown: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>>;
}
