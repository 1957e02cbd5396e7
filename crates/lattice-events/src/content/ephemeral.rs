//! Ephemeral content: presence, read receipts, typing notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

open_enum! {
    /// A user's presence state.
    pub enum PresenceState {
        Online => "online",
        Offline => "offline",
        Unavailable => "unavailable",
    }
}

/// `m.presence`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub presence: PresenceState,
    /// Milliseconds since the user last did something.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_ago: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
}

/// One user's receipt for one event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Receipt {
    /// When the receipt was sent, milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<u64>,
    /// Thread the receipt applies to, or `main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Receipt type (`m.read`, `m.read.private`) to user ID to receipt.
pub type ReceiptsByType = BTreeMap<String, BTreeMap<String, Receipt>>;

/// `m.receipt`: event ID to receipts for that event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptContent(pub BTreeMap<String, ReceiptsByType>);

impl ReceiptContent {
    /// Users with a public read receipt on `event_id`.
    pub fn readers(&self, event_id: &str) -> Vec<&str> {
        self.0
            .get(event_id)
            .and_then(|by_type| by_type.get("m.read"))
            .map(|users| users.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// `m.typing`
///
/// `user_ids` is required by the protocol but some servers omit it when
/// nobody is typing; absence is kept distinct from an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypingContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
}

impl TypingContent {
    /// Users currently typing. Empty when the field is absent.
    pub fn user_ids(&self) -> &[String] {
        self.user_ids.as_deref().unwrap_or_default()
    }
}

extra_fields!(
    PresenceContent,
    TypingContent,
);

impl super::ExtraFields for ReceiptContent {
    fn extra_mut(&mut self) -> Option<&mut Map<String, Value>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_receipt_nested_maps() {
        let json = json!({
            "$event": {
                "m.read": {"@alice:example.org": {"ts": 1436451550453_u64}},
                "m.read.private": {"@bob:example.org": {"ts": 1436451550000_u64}}
            }
        });
        let content: ReceiptContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.readers("$event"), vec!["@alice:example.org"]);
        assert!(content.readers("$other").is_empty());
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_typing_absent_and_empty_are_distinct() {
        let absent: TypingContent = serde_json::from_value(json!({})).unwrap();
        let empty: TypingContent = serde_json::from_value(json!({"user_ids": []})).unwrap();
        assert!(absent.user_ids().is_empty());
        assert!(empty.user_ids().is_empty());
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"user_ids": []}));
    }

    #[test]
    fn test_presence_unknown_state_is_kept() {
        let content: PresenceContent =
            serde_json::from_value(json!({"presence": "busy"})).unwrap();
        assert_eq!(content.presence, PresenceState::Other("busy".into()));
    }
}
