//! Data returned by the remote account client.

use serde::{Deserialize, Serialize};

/// Profile of the remote account a bridge user is logged into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Display name on the remote network.
    pub name: String,
    /// Handle without the leading `@`.
    pub username: String,
    /// Numeric account ID.
    pub id: u64,
}

/// A conversation known to the remote account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// A single message event in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntry {
    pub conversation_id: String,
    pub message_id: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Full inbox state as returned by the remote initial-state call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxSnapshot {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    #[serde(default)]
    pub entries: Vec<InboxEntry>,
}

impl InboxSnapshot {
    /// Drop all message entries, keeping only conversation state.
    ///
    /// A state-only resync must not redeliver messages that the regular
    /// poller has already handled or is about to handle.
    pub fn without_entries(mut self) -> Self {
        self.entries.clear();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_entries_keeps_conversations() {
        let snapshot = InboxSnapshot {
            conversations: vec![Conversation {
                id: "c1".into(),
                name: Some("Friends".into()),
                participants: vec!["1".into(), "2".into()],
            }],
            entries: vec![InboxEntry {
                conversation_id: "c1".into(),
                message_id: "m1".into(),
                text: Some("hi".into()),
            }],
        };
        let stripped = snapshot.without_entries();
        assert_eq!(stripped.conversations.len(), 1);
        assert!(stripped.entries.is_empty());
    }

    #[test]
    fn snapshot_missing_fields_default() {
        let snapshot: InboxSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.conversations.is_empty());
        assert!(snapshot.entries.is_empty());
    }
}
