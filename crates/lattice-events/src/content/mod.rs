//! Content schemas for every registered event type.
//!
//! Each submodule groups one category of the protocol:
//!
//! - [`call`]: VoIP call signaling (`m.call.*`)
//! - [`room`]: room state (`m.room.create`, `m.room.power_levels`, ...)
//! - [`message`]: room messages, stickers, reactions
//! - [`encryption`]: end-to-end encryption key material and ciphertext
//! - [`verification`]: interactive device verification (`m.key.verification.*`)
//! - [`policy`]: moderation policy rules (`m.policy.rule.*`)
//! - [`ephemeral`]: presence, receipts, typing
//! - [`account`]: per-user account data (tags, push rules, direct rooms, ...)
//!
//! Optional fields are `Option<T>` and are skipped when `None`, so a key
//! absent on the wire stays absent after re-encoding. Fields with a protocol
//! default keep the `Option` as a presence marker and expose the default
//! through an accessor method instead of storing it.
//!
//! Every struct-shaped schema also has an `extra` map. It holds wire keys
//! without a typed field (`m.mentions`, `m.new_content`, vendor keys) and
//! typed keys the server sent as an explicit `null`. Both come back out
//! verbatim on encode. When a typed field is set, it takes precedence over
//! an `extra` entry with the same key.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declares a string-valued protocol enum that stays open to future values.
///
/// Known wire strings map to dedicated variants; anything else lands in
/// `Other(String)` instead of failing, and serializes back unchanged.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// A value this version does not know about.
            Other(String),
        }

        impl $name {
            /// Returns the wire string for this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )*
                    Self::Other(value) => value,
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $( $wire => Self::$variant, )*
                    other => Self::Other(other.to_owned()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> Result<Self, D::Error> {
                let value = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(Self::from(value.as_str()))
            }
        }
    };
}

/// Implements [`ExtraFields`] for schemas with an `extra` map.
macro_rules! extra_fields {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::content::ExtraFields for $ty {
                fn extra_mut(
                    &mut self,
                ) -> Option<&mut ::serde_json::Map<String, ::serde_json::Value>> {
                    Some(&mut self.extra)
                }
            }
        )*
    };
}

pub mod account;
pub mod call;
pub mod encryption;
pub mod ephemeral;
pub mod message;
pub(crate) mod nested;
pub mod policy;
pub mod relation;
pub mod room;
pub mod verification;

// ---------------------------------------------------------------------------
// Untyped keys
// ---------------------------------------------------------------------------

/// A content schema that can hold wire keys outside its typed fields.
pub(crate) trait ExtraFields {
    /// The schema's `extra` map, or `None` for map-shaped content such as
    /// `m.direct`, whose keys are all data.
    fn extra_mut(&mut self) -> Option<&mut Map<String, Value>>;
}

/// Keys of `raw` missing from `encoded`, with their raw values.
///
/// After a typed decode, these are the keys a re-encode would lose.
pub(crate) fn residue(raw: &Map<String, Value>, encoded: &Value) -> Map<String, Value> {
    raw.iter()
        .filter(|(key, _)| encoded.get(key.as_str()).is_none())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Fallback values
// ---------------------------------------------------------------------------

/// Content of an event whose type is not registered, or whose payload does
/// not match the registered schema.
///
/// The JSON is kept untouched so callers can still inspect it, and so the
/// event re-encodes exactly as it was received.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueContent {
    /// The `type` of the event this content came from.
    pub event_type: String,
    /// The raw `content` object.
    pub content: Value,
}

impl OpaqueContent {
    /// Wraps raw content for the given event type.
    pub fn new(event_type: impl Into<String>, content: Value) -> Self {
        Self {
            event_type: event_type.into(),
            content,
        }
    }

    /// Looks up a top-level field of the raw content.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.content.get(key)
    }
}

/// A variant of a nested-discriminator family that was not decoded into a
/// typed body.
///
/// Produced when the secondary discriminator (`msgtype`, `algorithm`,
/// `method`, `action`) carries a value this version does not know, or when a
/// known value's body does not match its schema. The family's shared fields
/// are still decoded on the parent value; `fields` holds everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownVariant {
    /// The raw discriminator value.
    pub tag: String,
    /// Remaining fields, excluding the shared ones and the discriminator.
    pub fields: Map<String, Value>,
}

impl UnknownVariant {
    /// Looks up one of the variant-specific fields.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant `{}`", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    open_enum! {
        enum Flavor {
            Vanilla => "vanilla",
            Chocolate => "chocolate",
        }
    }

    #[test]
    fn test_open_enum_known_value() {
        let flavor: Flavor = serde_json::from_str("\"vanilla\"").unwrap();
        assert_eq!(flavor, Flavor::Vanilla);
        assert_eq!(serde_json::to_string(&flavor).unwrap(), "\"vanilla\"");
    }

    #[test]
    fn test_open_enum_unknown_value_is_preserved() {
        let flavor: Flavor = serde_json::from_str("\"pistachio\"").unwrap();
        assert_eq!(flavor, Flavor::Other("pistachio".into()));
        assert_eq!(flavor.to_string(), "pistachio");
        assert_eq!(serde_json::to_string(&flavor).unwrap(), "\"pistachio\"");
    }

    #[test]
    fn test_open_enum_rejects_non_string() {
        assert!(serde_json::from_str::<Flavor>("7").is_err());
    }

    #[test]
    fn test_residue_lists_keys_lost_on_encode() {
        let raw = serde_json::json!({"kept": 1, "dropped": null, "vendor.key": [1]});
        let Value::Object(raw) = raw else {
            unreachable!();
        };
        let residue = residue(&raw, &serde_json::json!({"kept": 1}));
        assert_eq!(residue.len(), 2);
        assert_eq!(residue["dropped"], Value::Null);
        assert_eq!(residue["vendor.key"], serde_json::json!([1]));
    }

    #[test]
    fn test_opaque_content_get() {
        let opaque = OpaqueContent::new("x.custom", serde_json::json!({"a": 1}));
        assert_eq!(opaque.get("a"), Some(&serde_json::json!(1)));
        assert_eq!(opaque.get("b"), None);
    }
}
