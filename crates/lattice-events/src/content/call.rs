//! VoIP call signaling (`m.call.*`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `version` field of call events.
///
/// Version 0 clients send the integer `0`; later versions send a string
/// such as `"1"`. Both forms are kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallVersion {
    /// Legacy integer version.
    Integer(u64),
    /// String version (`"1"` and later).
    String(String),
}

/// An SDP offer or answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// `offer` or `answer`.
    #[serde(rename = "type")]
    pub kind: String,
    /// The SDP text.
    pub sdp: String,
}

/// A single ICE candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// The SDP `a=` line of the candidate.
    pub candidate: String,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u64>,
}

/// `m.call.invite`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInviteContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    /// Milliseconds the invite is valid for after it was sent.
    pub lifetime: u64,
    pub offer: SessionDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
    /// Restricts the invite to one user in a group room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee: Option<String>,
}

/// `m.call.candidates`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCandidatesContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
}

/// `m.call.answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAnswerContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    pub answer: SessionDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
}

/// `m.call.hangup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallHangupContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    /// `ice_failed`, `invite_timeout`, `user_hangup`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id: Option<String>,
}

/// `m.call.reject`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRejectContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    pub party_id: String,
}

/// `m.call.select_answer`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSelectAnswerContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    pub party_id: String,
    /// The party whose answer the caller picked.
    pub selected_party_id: String,
}

/// `m.call.negotiate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNegotiateContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub call_id: String,
    pub version: CallVersion,
    pub party_id: String,
    pub lifetime: u64,
    pub description: SessionDescription,
}

extra_fields!(
    CallInviteContent,
    CallCandidatesContent,
    CallAnswerContent,
    CallHangupContent,
    CallRejectContent,
    CallSelectAnswerContent,
    CallNegotiateContent,
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_call_version_accepts_integer_and_string() {
        let v0: CallVersion = serde_json::from_value(json!(0)).unwrap();
        let v1: CallVersion = serde_json::from_value(json!("1")).unwrap();
        assert_eq!(v0, CallVersion::Integer(0));
        assert_eq!(v1, CallVersion::String("1".into()));
        assert_eq!(serde_json::to_value(&v0).unwrap(), json!(0));
        assert_eq!(serde_json::to_value(&v1).unwrap(), json!("1"));
    }

    #[test]
    fn test_candidate_uses_camel_case_wire_keys() {
        let json = json!({
            "candidate": "candidate:863018703 1 udp 2122260223 10.9.64.156 43670 typ host",
            "sdpMid": "audio",
            "sdpMLineIndex": 0
        });
        let candidate: Candidate = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(candidate.sdp_mid.as_deref(), Some("audio"));
        assert_eq!(candidate.sdp_m_line_index, Some(0));
        assert_eq!(serde_json::to_value(&candidate).unwrap(), json);
    }

    #[test]
    fn test_invite_requires_offer() {
        let json = json!({"call_id": "c1", "version": 0, "lifetime": 60000});
        assert!(serde_json::from_value::<CallInviteContent>(json).is_err());
    }

    #[test]
    fn test_hangup_without_reason_omits_key() {
        let hangup = CallHangupContent {
            extra: Map::new(),
            call_id: "c1".into(),
            version: CallVersion::Integer(0),
            reason: None,
            party_id: None,
        };
        let json = serde_json::to_value(&hangup).unwrap();
        assert_eq!(json, json!({"call_id": "c1", "version": 0}));
    }
}
