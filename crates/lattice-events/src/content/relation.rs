//! Relations between events (`m.relates_to`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `m.relates_to` object carried by replies, edits, reactions, threads,
/// and in-room verification messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelatesTo {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Relation type, e.g. `m.annotation`, `m.replace`, `m.reference`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_type: Option<String>,

    /// The event this one relates to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Annotation key (the emoji of a reaction).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Rich reply target.
    #[serde(
        rename = "m.in_reply_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub in_reply_to: Option<InReplyTo>,
}

impl RelatesTo {
    /// Builds a relation of `rel_type` pointing at `event_id`.
    pub fn new(rel_type: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            rel_type: Some(rel_type.into()),
            event_id: Some(event_id.into()),
            ..Self::default()
        }
    }
}

/// Target of a rich reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InReplyTo {
    /// The event being replied to.
    pub event_id: String,
}
