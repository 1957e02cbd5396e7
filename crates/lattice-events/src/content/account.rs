//! Per-user account data: tags, push rules, direct rooms, and friends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `m.tag`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Tag name (`m.favourite`, `m.lowpriority`, `u.work`, ...) to tag info.
    pub tags: BTreeMap<String, TagInfo>,
}

/// Ordering information for one tag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagInfo {
    /// Position of the room within the tag, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

// ---------------------------------------------------------------------------
// m.push_rules
// ---------------------------------------------------------------------------

/// `m.push_rules`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushRulesContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub global: Ruleset,
}

/// The five rule kinds, evaluated in this order: override, content, room,
/// sender, underride.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_rules: Option<Vec<PushRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<PushRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Vec<PushRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Vec<PushRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underride: Option<Vec<PushRule>>,
}

impl Ruleset {
    /// Iterates every rule in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &PushRule> {
        [
            &self.override_rules,
            &self.content,
            &self.room,
            &self.sender,
            &self.underride,
        ]
        .into_iter()
        .flatten()
        .flatten()
    }

    /// Finds a rule by ID across all kinds.
    pub fn find(&self, rule_id: &str) -> Option<&PushRule> {
        self.iter().find(|rule| rule.rule_id == rule_id)
    }
}

/// A single push rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRule {
    pub rule_id: String,
    /// Whether this is a server-default rule.
    pub default: bool,
    pub enabled: bool,
    /// `notify`, `dont_notify`, or `{"set_tweak": ...}` objects.
    pub actions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<PushCondition>>,
    /// Glob for `content` rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A condition of an override or underride rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushCondition {
    /// `event_match`, `contains_display_name`, `room_member_count`, ...
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Comparison for `room_member_count`, e.g. `>=2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

// ---------------------------------------------------------------------------
// Small account data
// ---------------------------------------------------------------------------

/// `m.direct`: user ID to the direct-message rooms shared with them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectContent(pub BTreeMap<String, Vec<String>>);

impl DirectContent {
    /// Returns `true` if `room_id` is a direct-message room with anyone.
    pub fn is_direct_room(&self, room_id: &str) -> bool {
        self.0.values().flatten().any(|id| id == room_id)
    }
}

/// `m.ignored_user_list`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IgnoredUserListContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// User ID to an empty object reserved for future use.
    pub ignored_users: BTreeMap<String, IgnoredUser>,
}

/// Placeholder value in `ignored_users`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IgnoredUser {}

impl IgnoredUserListContent {
    pub fn is_ignored(&self, user_id: &str) -> bool {
        self.ignored_users.contains_key(user_id)
    }
}

/// `m.accepted_terms`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcceptedTermsContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// URLs of the terms documents the user agreed to.
    pub accepted: Vec<String>,
}

/// `m.fully_read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullyReadContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub event_id: String,
}

/// `m.identity_server`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityServerContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// `None` when the user chose not to use an identity server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

extra_fields!(
    TagContent,
    PushRulesContent,
    IgnoredUserListContent,
    AcceptedTermsContent,
    FullyReadContent,
    IdentityServerContent,
);

impl super::ExtraFields for DirectContent {
    fn extra_mut(&mut self) -> Option<&mut Map<String, Value>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_push_rules_override_key() {
        let json = json!({
            "global": {
                "override": [{
                    "rule_id": ".m.rule.master",
                    "default": true,
                    "enabled": false,
                    "actions": [],
                    "conditions": []
                }],
                "content": [{
                    "rule_id": ".m.rule.contains_user_name",
                    "default": true,
                    "enabled": true,
                    "pattern": "alice",
                    "actions": ["notify", {"set_tweak": "sound", "value": "default"}]
                }]
            }
        });
        let content: PushRulesContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.global.iter().count(), 2);
        let master = content.global.find(".m.rule.master").unwrap();
        assert!(!master.enabled);
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_direct_rooms() {
        let content: DirectContent = serde_json::from_value(json!({
            "@bob:example.org": ["!dm:example.org"]
        }))
        .unwrap();
        assert!(content.is_direct_room("!dm:example.org"));
        assert!(!content.is_direct_room("!group:example.org"));
    }

    #[test]
    fn test_ignored_users_round_trip() {
        let json = json!({"ignored_users": {"@troll:example.org": {}}});
        let content: IgnoredUserListContent = serde_json::from_value(json.clone()).unwrap();
        assert!(content.is_ignored("@troll:example.org"));
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_tag_order_is_optional() {
        let json = json!({"tags": {"m.favourite": {"order": 0.5}, "u.work": {}}});
        let content: TagContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.tags["m.favourite"].order, Some(0.5));
        assert_eq!(content.tags["u.work"].order, None);
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }
}
