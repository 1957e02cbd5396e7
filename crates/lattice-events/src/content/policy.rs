//! Moderation policy rules (`m.policy.rule.user`, `.room`, `.server`).
//!
//! All three event types share one schema; the event type says what kind of
//! entity the glob in `entity` matches.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

open_enum! {
    /// What a policy list recommends doing with matching entities.
    pub enum Recommendation {
        Ban => "m.ban",
    }
}

/// Content of every `m.policy.rule.*` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRuleContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Glob matched against user IDs, room IDs, or server names.
    pub entity: String,
    pub reason: String,
    pub recommendation: Recommendation,
}

impl PolicyRuleContent {
    /// Returns `true` if the rule recommends a ban.
    pub fn is_ban(&self) -> bool {
        self.recommendation == Recommendation::Ban
    }
}

extra_fields!(PolicyRuleContent);
