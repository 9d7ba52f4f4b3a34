//! Collaborators for the offline console.
//!
//! No remote account is connected, so every identity is logged out. Notice
//! rooms are kept in memory for the lifetime of the process.

use puppet_types::{AccountInfo, Bridge, CommandError, InboxSnapshot, ReplySink};
use std::collections::HashMap;
use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

/// A bridge with no remote connections.
#[derive(Default)]
pub struct OfflineBridge {
    notice_rooms: Mutex<HashMap<String, String>>,
}

impl OfflineBridge {
    pub fn notice_room(&self, identity: &str) -> Option<String> {
        self.notice_rooms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }
}

impl Bridge for OfflineBridge {
    fn is_logged_in<'a>(
        &'a self,
        _identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, CommandError>> + Send + 'a>> {
        Box::pin(async { Ok(false) })
    }

    fn account_info<'a>(
        &'a self,
        _identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AccountInfo, CommandError>> + Send + 'a>> {
        Box::pin(async { Err(CommandError::NotLoggedIn) })
    }

    fn set_notice_room<'a>(
        &'a self,
        identity: &'a str,
        room: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>> {
        Box::pin(async move {
            self.notice_rooms
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(identity.to_string(), room.to_string());
            tracing::info!(identity, room, "Notice room updated");
            Ok(())
        })
    }

    fn inbox_initial_state<'a>(
        &'a self,
        _identity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<InboxSnapshot, CommandError>> + Send + 'a>> {
        Box::pin(async { Err(CommandError::NotLoggedIn) })
    }

    fn dispatch_all<'a>(
        &'a self,
        identity: &'a str,
        snapshot: InboxSnapshot,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(
                identity,
                conversations = snapshot.conversations.len(),
                "Discarding snapshot, no portals offline"
            );
            Ok(())
        })
    }
}

/// Prints replies to stdout.
pub struct TerminalSink;

impl ReplySink for TerminalSink {
    fn send<'a>(
        &'a self,
        room: &'a str,
        markdown: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandError>> + Send + 'a>> {
        Box::pin(async move {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(out, "[{room}] {markdown}").map_err(|e| CommandError::Reply(e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_bridge_is_logged_out() {
        let bridge = OfflineBridge::default();
        assert!(!bridge.is_logged_in("@a:b").await.unwrap());
        assert!(matches!(
            bridge.account_info("@a:b").await,
            Err(CommandError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn test_offline_bridge_keeps_notice_room() {
        let bridge = OfflineBridge::default();
        bridge.set_notice_room("@a:b", "!room:b").await.unwrap();
        assert_eq!(bridge.notice_room("@a:b").as_deref(), Some("!room:b"));
        assert_eq!(bridge.notice_room("@c:d"), None);
    }
}
