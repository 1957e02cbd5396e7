//! End-to-end encryption: key material, key requests, and ciphertext.
//!
//! Two nested families live here: `m.room.encrypted` is dispatched by
//! `algorithm`, and `m.room_key_request` by `action`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::nested::{self, Variant, VariantTable};
use super::relation::RelatesTo;
use super::UnknownVariant;

/// Discriminator key of `m.room.encrypted`.
pub const ALGORITHM_KEY: &str = "algorithm";

/// Discriminator key of `m.room_key_request`.
pub const ACTION_KEY: &str = "action";

/// Olm algorithm identifier.
pub const OLM_V1: &str = "m.olm.v1.curve25519-aes-sha2";

/// Megolm algorithm identifier.
pub const MEGOLM_V1: &str = "m.megolm.v1.aes-sha2";

// ---------------------------------------------------------------------------
// Key material
// ---------------------------------------------------------------------------

/// `m.room_key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomKeyContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub algorithm: String,
    pub room_id: String,
    pub session_id: String,
    pub session_key: String,
}

/// `m.forwarded_room_key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedRoomKeyContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub algorithm: String,
    pub room_id: String,
    pub sender_key: String,
    pub session_id: String,
    pub session_key: String,
    pub sender_claimed_ed25519_key: String,
    pub forwarding_curve25519_key_chain: Vec<String>,
}

/// `m.room_key.withheld`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomKeyWithheldContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub sender_key: String,
    /// `m.blacklisted`, `m.unverified`, `m.unauthorised`, ...
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `m.dummy`, sent to-device to force a new Olm session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DummyContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `m.secret.request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRequestContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Secret name; only present on `request`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `request` or `request_cancellation`.
    pub action: String,
    pub requesting_device_id: String,
    pub request_id: String,
}

/// `m.secret.send`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSendContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub request_id: String,
    pub secret: String,
}

// ---------------------------------------------------------------------------
// m.room_key_request
// ---------------------------------------------------------------------------

/// Identifies the Megolm session whose key is being requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedKeyInfo {
    pub algorithm: String,
    pub room_id: String,
    pub session_id: String,
    /// Deprecated, still sent by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_key: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct KeyRequestBody {
    body: RequestedKeyInfo,
}

/// The `action`-specific part of `m.room_key_request`.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyRequestAction {
    /// `request`: asks other devices for a session key.
    Request(RequestedKeyInfo),
    /// `request_cancellation`: withdraws an earlier request.
    Cancellation,
    Unknown(UnknownVariant),
}

impl Variant for KeyRequestAction {
    fn tag(&self) -> &str {
        match self {
            Self::Request(_) => "request",
            Self::Cancellation => "request_cancellation",
            Self::Unknown(unknown) => &unknown.tag,
        }
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Request(info) => serde_json::to_value(KeyRequestBody { body: info.clone() }),
            Self::Cancellation => Ok(Value::Null),
            Self::Unknown(unknown) => Ok(Value::Object(unknown.fields.clone())),
        }
    }
}

static KEY_REQUEST_ACTIONS: LazyLock<VariantTable<KeyRequestAction>> = LazyLock::new(|| {
    VariantTable::new(
        ACTION_KEY,
        KeyRequestAction::Unknown,
        &[
            ("request", |v| {
                KeyRequestBody::deserialize(v).map(|b| KeyRequestAction::Request(b.body))
            }),
            ("request_cancellation", |_| Ok(KeyRequestAction::Cancellation)),
        ],
    )
});

/// `m.room_key_request`
#[derive(Debug, Clone, PartialEq)]
pub struct RoomKeyRequestContent {
    pub requesting_device_id: String,
    /// Shared by a request and its cancellation.
    pub request_id: String,
    pub action: KeyRequestAction,
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct KeyRequestShared {
    requesting_device_id: String,
    request_id: String,
}

impl Serialize for RoomKeyRequestContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shared = KeyRequestShared {
            requesting_device_id: self.requesting_device_id.clone(),
            request_id: self.request_id.clone(),
        };
        nested::serialize_value(
            nested::encode(&shared, KEY_REQUEST_ACTIONS.key(), &self.action, &self.extra),
            serializer,
        )
    }
}

impl<'de> Deserialize<'de> for RoomKeyRequestContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let nested::Decoded { shared, kind: action, extra } =
            nested::decode::<KeyRequestShared, _>(value, &KEY_REQUEST_ACTIONS)
                .map_err(serde::de::Error::custom)?;
        Ok(Self {
            requesting_device_id: shared.requesting_device_id,
            request_id: shared.request_id,
            action,
            extra,
        })
    }
}

// ---------------------------------------------------------------------------
// m.room.encrypted
// ---------------------------------------------------------------------------

/// One Olm ciphertext, addressed to a single recipient key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OlmMessage {
    /// 0 for a pre-key message, 1 for a normal message.
    #[serde(rename = "type")]
    pub message_type: u8,
    pub body: String,
}

/// Olm payload: ciphertexts keyed by recipient Curve25519 key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OlmCiphertext {
    pub ciphertext: BTreeMap<String, OlmMessage>,
}

/// Megolm payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MegolmCiphertext {
    pub ciphertext: String,
    pub session_id: String,
    /// Deprecated, still sent by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// The `algorithm`-specific part of `m.room.encrypted`.
#[derive(Debug, Clone, PartialEq)]
pub enum EncryptedScheme {
    OlmV1(OlmCiphertext),
    MegolmV1(MegolmCiphertext),
    Unknown(UnknownVariant),
}

impl Variant for EncryptedScheme {
    fn tag(&self) -> &str {
        match self {
            Self::OlmV1(_) => OLM_V1,
            Self::MegolmV1(_) => MEGOLM_V1,
            Self::Unknown(unknown) => &unknown.tag,
        }
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::OlmV1(body) => serde_json::to_value(body),
            Self::MegolmV1(body) => serde_json::to_value(body),
            Self::Unknown(unknown) => Ok(Value::Object(unknown.fields.clone())),
        }
    }
}

static ENCRYPTED_SCHEMES: LazyLock<VariantTable<EncryptedScheme>> = LazyLock::new(|| {
    VariantTable::new(
        ALGORITHM_KEY,
        EncryptedScheme::Unknown,
        &[
            (OLM_V1, |v| OlmCiphertext::deserialize(v).map(EncryptedScheme::OlmV1)),
            (MEGOLM_V1, |v| {
                MegolmCiphertext::deserialize(v).map(EncryptedScheme::MegolmV1)
            }),
        ],
    )
});

/// `m.room.encrypted`
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedContent {
    /// Curve25519 key of the sender. Required for Olm, deprecated for Megolm.
    pub sender_key: Option<String>,
    /// Relations stay in cleartext so servers can aggregate them.
    pub relates_to: Option<RelatesTo>,
    pub scheme: EncryptedScheme,
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct EncryptedShared {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender_key: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    relates_to: Option<RelatesTo>,
}

impl EncryptedContent {
    /// The raw `algorithm` value.
    pub fn algorithm(&self) -> &str {
        self.scheme.tag()
    }
}

impl Serialize for EncryptedContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shared = EncryptedShared {
            sender_key: self.sender_key.clone(),
            relates_to: self.relates_to.clone(),
        };
        nested::serialize_value(
            nested::encode(&shared, ENCRYPTED_SCHEMES.key(), &self.scheme, &self.extra),
            serializer,
        )
    }
}

impl<'de> Deserialize<'de> for EncryptedContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let nested::Decoded { shared, kind: scheme, extra } =
            nested::decode::<EncryptedShared, _>(value, &ENCRYPTED_SCHEMES)
                .map_err(serde::de::Error::custom)?;
        Ok(Self {
            sender_key: shared.sender_key,
            relates_to: shared.relates_to,
            scheme,
            extra,
        })
    }
}

extra_fields!(
    RoomKeyContent,
    ForwardedRoomKeyContent,
    RoomKeyWithheldContent,
    DummyContent,
    SecretRequestContent,
    SecretSendContent,
    RoomKeyRequestContent,
    EncryptedContent,
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_megolm_payload_decodes() {
        let json = json!({
            "algorithm": "m.megolm.v1.aes-sha2",
            "sender_key": "curve-key",
            "device_id": "DEVICE",
            "session_id": "session",
            "ciphertext": "AwgAEnAC"
        });
        let content: EncryptedContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.algorithm(), MEGOLM_V1);
        assert_eq!(content.sender_key.as_deref(), Some("curve-key"));
        let EncryptedScheme::MegolmV1(ref megolm) = content.scheme else {
            panic!("expected megolm");
        };
        assert_eq!(megolm.session_id, "session");
        assert_eq!(megolm.device_id.as_deref(), Some("DEVICE"));
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_olm_payload_decodes_per_recipient() {
        let content: EncryptedContent = serde_json::from_value(json!({
            "algorithm": "m.olm.v1.curve25519-aes-sha2",
            "sender_key": "sender",
            "ciphertext": {"recipient": {"type": 0, "body": "opaque"}}
        }))
        .unwrap();
        let EncryptedScheme::OlmV1(olm) = content.scheme else {
            panic!("expected olm");
        };
        assert_eq!(olm.ciphertext["recipient"].message_type, 0);
    }

    #[test]
    fn test_unknown_algorithm_keeps_payload() {
        let json = json!({
            "algorithm": "org.example.pq-ratchet",
            "sender_key": "k",
            "blob": "abc"
        });
        let content: EncryptedContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.algorithm(), "org.example.pq-ratchet");
        let EncryptedScheme::Unknown(ref unknown) = content.scheme else {
            panic!("expected unknown scheme");
        };
        assert_eq!(unknown.get("blob"), Some(&json!("abc")));
        assert!(unknown.get("sender_key").is_none());
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_key_request_dispatches_on_action() {
        let json = json!({
            "action": "request",
            "requesting_device_id": "DEV",
            "request_id": "r1",
            "body": {
                "algorithm": "m.megolm.v1.aes-sha2",
                "room_id": "!room:example.org",
                "session_id": "s"
            }
        });
        let content: RoomKeyRequestContent = serde_json::from_value(json.clone()).unwrap();
        let KeyRequestAction::Request(ref info) = content.action else {
            panic!("expected request");
        };
        assert_eq!(info.room_id, "!room:example.org");
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_key_request_cancellation_has_no_body() {
        let json = json!({
            "action": "request_cancellation",
            "requesting_device_id": "DEV",
            "request_id": "r1"
        });
        let content: RoomKeyRequestContent = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(content.action, KeyRequestAction::Cancellation);
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_dummy_encodes_as_empty_object() {
        assert_eq!(serde_json::to_value(DummyContent::default()).unwrap(), json!({}));
    }
}
