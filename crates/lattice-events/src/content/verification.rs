//! Interactive key verification (`m.key.verification.*`).
//!
//! Verification messages travel either to-device (identified by
//! `transaction_id`) or in a room (identified by an `m.reference` relation to
//! the request event), so both fields are optional on every message.
//! `start` and `accept` are nested families dispatched by `method`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::nested::{self, Variant, VariantTable};
use super::relation::RelatesTo;
use super::UnknownVariant;

/// Discriminator key of `start` and `accept`.
pub const METHOD_KEY: &str = "method";

/// Short authentication string method.
pub const SAS_V1: &str = "m.sas.v1";

/// QR code reciprocation method.
pub const RECIPROCATE_V1: &str = "m.reciprocate.v1";

/// `m.key.verification.request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequestContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub from_device: String,
    pub methods: Vec<String>,
    /// Milliseconds since the epoch when the request was made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// `m.key.verification.ready`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReadyContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub from_device: String,
    pub methods: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relates_to: Option<RelatesTo>,
}

/// `m.key.verification.key`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKeyContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The device's ephemeral public key, unpadded base64.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relates_to: Option<RelatesTo>,
}

/// `m.key.verification.mac`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMacContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Key ID to MAC of that key.
    pub mac: BTreeMap<String, String>,
    /// MAC of the comma-separated, sorted key IDs in `mac`.
    pub keys: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relates_to: Option<RelatesTo>,
}

/// `m.key.verification.cancel`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCancelContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// `m.user`, `m.timeout`, `m.mismatched_sas`, ...
    pub code: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relates_to: Option<RelatesTo>,
}

/// `m.key.verification.done`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerificationDoneContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub relates_to: Option<RelatesTo>,
}

// ---------------------------------------------------------------------------
// m.key.verification.start
// ---------------------------------------------------------------------------

/// `m.sas.v1` parameters offered by the starting device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasStart {
    pub key_agreement_protocols: Vec<String>,
    pub hashes: Vec<String>,
    pub message_authentication_codes: Vec<String>,
    /// `decimal` and/or `emoji`.
    pub short_authentication_string: Vec<String>,
}

/// `m.reciprocate.v1` parameters (QR code scanned).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReciprocateStart {
    /// The shared secret from the QR code, unpadded base64.
    pub secret: String,
}

/// The `method`-specific part of a verification start.
#[derive(Debug, Clone, PartialEq)]
pub enum StartMethod {
    SasV1(SasStart),
    ReciprocateV1(ReciprocateStart),
    Unknown(UnknownVariant),
}

impl Variant for StartMethod {
    fn tag(&self) -> &str {
        match self {
            Self::SasV1(_) => SAS_V1,
            Self::ReciprocateV1(_) => RECIPROCATE_V1,
            Self::Unknown(unknown) => &unknown.tag,
        }
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::SasV1(body) => serde_json::to_value(body),
            Self::ReciprocateV1(body) => serde_json::to_value(body),
            Self::Unknown(unknown) => Ok(Value::Object(unknown.fields.clone())),
        }
    }
}

static START_METHODS: LazyLock<VariantTable<StartMethod>> = LazyLock::new(|| {
    VariantTable::new(
        METHOD_KEY,
        StartMethod::Unknown,
        &[
            (SAS_V1, |v| SasStart::deserialize(v).map(StartMethod::SasV1)),
            (RECIPROCATE_V1, |v| {
                ReciprocateStart::deserialize(v).map(StartMethod::ReciprocateV1)
            }),
        ],
    )
});

/// `m.key.verification.start`
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationStartContent {
    pub from_device: String,
    pub transaction_id: Option<String>,
    pub relates_to: Option<RelatesTo>,
    pub method: StartMethod,
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct StartShared {
    from_device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    relates_to: Option<RelatesTo>,
}

impl Serialize for VerificationStartContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shared = StartShared {
            from_device: self.from_device.clone(),
            transaction_id: self.transaction_id.clone(),
            relates_to: self.relates_to.clone(),
        };
        nested::serialize_value(
            nested::encode(&shared, START_METHODS.key(), &self.method, &self.extra),
            serializer,
        )
    }
}

impl<'de> Deserialize<'de> for VerificationStartContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let nested::Decoded { shared, kind: method, extra } =
            nested::decode::<StartShared, _>(value, &START_METHODS)
                .map_err(serde::de::Error::custom)?;
        Ok(Self {
            from_device: shared.from_device,
            transaction_id: shared.transaction_id,
            relates_to: shared.relates_to,
            method,
            extra,
        })
    }
}

// ---------------------------------------------------------------------------
// m.key.verification.accept
// ---------------------------------------------------------------------------

/// `m.sas.v1` parameters chosen by the accepting device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SasAccept {
    pub key_agreement_protocol: String,
    pub hash: String,
    pub message_authentication_code: String,
    pub short_authentication_string: Vec<String>,
    /// Hash of the accepting device's ephemeral key and the start content.
    pub commitment: String,
}

/// The `method`-specific part of a verification accept.
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptMethod {
    SasV1(SasAccept),
    Unknown(UnknownVariant),
}

impl Variant for AcceptMethod {
    fn tag(&self) -> &str {
        match self {
            Self::SasV1(_) => SAS_V1,
            Self::Unknown(unknown) => &unknown.tag,
        }
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::SasV1(body) => serde_json::to_value(body),
            Self::Unknown(unknown) => Ok(Value::Object(unknown.fields.clone())),
        }
    }
}

static ACCEPT_METHODS: LazyLock<VariantTable<AcceptMethod>> = LazyLock::new(|| {
    VariantTable::new(
        METHOD_KEY,
        AcceptMethod::Unknown,
        &[(SAS_V1, |v| SasAccept::deserialize(v).map(AcceptMethod::SasV1))],
    )
});

/// `m.key.verification.accept`
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationAcceptContent {
    pub transaction_id: Option<String>,
    pub relates_to: Option<RelatesTo>,
    pub method: AcceptMethod,
    /// Keys outside the typed schema, written back unchanged.
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct AcceptShared {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    relates_to: Option<RelatesTo>,
}

impl Serialize for VerificationAcceptContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shared = AcceptShared {
            transaction_id: self.transaction_id.clone(),
            relates_to: self.relates_to.clone(),
        };
        nested::serialize_value(
            nested::encode(&shared, ACCEPT_METHODS.key(), &self.method, &self.extra),
            serializer,
        )
    }
}

impl<'de> Deserialize<'de> for VerificationAcceptContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let nested::Decoded { shared, kind: method, extra } =
            nested::decode::<AcceptShared, _>(value, &ACCEPT_METHODS)
                .map_err(serde::de::Error::custom)?;
        Ok(Self {
            transaction_id: shared.transaction_id,
            relates_to: shared.relates_to,
            method,
            extra,
        })
    }
}

extra_fields!(
    VerificationRequestContent,
    VerificationReadyContent,
    VerificationKeyContent,
    VerificationMacContent,
    VerificationCancelContent,
    VerificationDoneContent,
    VerificationStartContent,
    VerificationAcceptContent,
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sas_start_round_trip() {
        let json = json!({
            "from_device": "BOB",
            "transaction_id": "txn",
            "method": "m.sas.v1",
            "key_agreement_protocols": ["curve25519-hkdf-sha256"],
            "hashes": ["sha256"],
            "message_authentication_codes": ["hkdf-hmac-sha256.v2"],
            "short_authentication_string": ["decimal", "emoji"]
        });
        let content: VerificationStartContent = serde_json::from_value(json.clone()).unwrap();
        let StartMethod::SasV1(ref sas) = content.method else {
            panic!("expected sas");
        };
        assert_eq!(sas.hashes, vec!["sha256".to_string()]);
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_reciprocate_start_in_room() {
        let content: VerificationStartContent = serde_json::from_value(json!({
            "from_device": "BOB",
            "method": "m.reciprocate.v1",
            "secret": "c2VjcmV0",
            "m.relates_to": {"rel_type": "m.reference", "event_id": "$req"}
        }))
        .unwrap();
        assert!(content.transaction_id.is_none());
        assert_eq!(
            content.relates_to.unwrap().event_id.as_deref(),
            Some("$req")
        );
        assert!(matches!(content.method, StartMethod::ReciprocateV1(ref r) if r.secret == "c2VjcmV0"));
    }

    #[test]
    fn test_unknown_start_method_keeps_shared_fields() {
        let content: VerificationStartContent = serde_json::from_value(json!({
            "from_device": "BOB",
            "transaction_id": "txn",
            "method": "org.example.pake",
            "group": "p256"
        }))
        .unwrap();
        assert_eq!(content.from_device, "BOB");
        assert_eq!(content.transaction_id.as_deref(), Some("txn"));
        let StartMethod::Unknown(unknown) = content.method else {
            panic!("expected unknown method");
        };
        assert_eq!(unknown.tag, "org.example.pake");
        assert_eq!(unknown.get("group"), Some(&json!("p256")));
    }

    #[test]
    fn test_sas_accept_round_trip() {
        let json = json!({
            "transaction_id": "txn",
            "method": "m.sas.v1",
            "key_agreement_protocol": "curve25519-hkdf-sha256",
            "hash": "sha256",
            "message_authentication_code": "hkdf-hmac-sha256.v2",
            "short_authentication_string": ["emoji"],
            "commitment": "abc"
        });
        let content: VerificationAcceptContent = serde_json::from_value(json.clone()).unwrap();
        assert!(matches!(content.method, AcceptMethod::SasV1(_)));
        assert_eq!(serde_json::to_value(&content).unwrap(), json);
    }

    #[test]
    fn test_cancel_requires_code_and_reason() {
        assert!(serde_json::from_value::<VerificationCancelContent>(json!({"code": "m.user"}))
            .is_err());
    }
}
