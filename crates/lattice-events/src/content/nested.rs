//! Two-phase decoding for content kinds with a secondary discriminator.
//!
//! Some content types are themselves tagged unions: `m.room.message` picks
//! its shape from `msgtype`, `m.room.encrypted` from `algorithm`, and so on.
//! Decoding happens in two explicit steps:
//!
//! 1. Decode the family's shared fields and read the discriminator.
//! 2. Look the discriminator up in the family's [`VariantTable`] and decode
//!    the variant body from the same object.
//!
//! Every level has its own fallback: an unrecognized discriminator (or a
//! recognized one whose body does not fit) becomes an [`UnknownVariant`]
//! holding the leftover fields. Only a missing discriminator or broken shared
//! fields fail the decode. For a typed variant, keys that neither the shared
//! fields nor the variant re-encode are returned separately so the content
//! type can keep them.

use std::collections::HashMap;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{UnknownVariant, residue};

/// Decodes one variant body from the full content object.
pub(crate) type VariantDecoder<K> = fn(&Value) -> Result<K, serde_json::Error>;

/// A variant of a nested family: knows its discriminator value and how to
/// write its own fields back out.
pub(crate) trait Variant {
    /// The discriminator value for this variant.
    fn tag(&self) -> &str;

    /// The variant-specific fields as a JSON object.
    fn fields(&self) -> Result<Value, serde_json::Error>;
}

/// Lookup table from discriminator value to variant decoder.
pub(crate) struct VariantTable<K> {
    key: &'static str,
    variants: HashMap<&'static str, VariantDecoder<K>>,
    fallback: fn(UnknownVariant) -> K,
}

impl<K> VariantTable<K> {
    pub(crate) fn new(
        key: &'static str,
        fallback: fn(UnknownVariant) -> K,
        entries: &[(&'static str, VariantDecoder<K>)],
    ) -> Self {
        Self {
            key,
            variants: entries.iter().copied().collect(),
            fallback,
        }
    }

    /// The name of the discriminator field, e.g. `"msgtype"`.
    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    /// Returns `true` if `tag` has a typed variant.
    pub(crate) fn is_known(&self, tag: &str) -> bool {
        self.variants.contains_key(tag)
    }
}

/// Output of [`decode`].
pub(crate) struct Decoded<C, K> {
    /// The family's shared fields.
    pub(crate) shared: C,
    pub(crate) kind: K,
    /// Keys neither the shared fields nor a typed variant re-encode. Always
    /// empty for an unknown variant, whose leftover fields hold them.
    pub(crate) extra: Map<String, Value>,
}

/// Runs both decoding phases.
pub(crate) fn decode<C, K>(
    value: Value,
    table: &VariantTable<K>,
) -> Result<Decoded<C, K>, serde_json::Error>
where
    C: Serialize + DeserializeOwned,
    K: Variant,
{
    let Value::Object(object) = value else {
        return Err(serde_json::Error::custom("expected a JSON object"));
    };

    // Phase one: shared fields and the discriminator.
    let shared: C = serde_json::from_value(Value::Object(object.clone()))?;
    let tag = match object.get(table.key) {
        Some(Value::String(tag)) => tag.clone(),
        Some(_) => {
            return Err(serde_json::Error::custom(format!(
                "`{}` must be a string",
                table.key
            )));
        }
        None => {
            return Err(serde_json::Error::missing_field(table.key));
        }
    };

    // Phase two: the variant body.
    if let Some(decode_variant) = table.variants.get(tag.as_str()) {
        match decode_variant(&Value::Object(object.clone())) {
            Ok(kind) => {
                let encoded = encode(&shared, table.key, &kind, &Map::new())?;
                let extra = residue(&object, &encoded);
                return Ok(Decoded {
                    shared,
                    kind,
                    extra,
                });
            }
            Err(error) => {
                tracing::debug!(
                    key = table.key,
                    %tag,
                    %error,
                    "variant body does not match its schema, keeping it untyped"
                );
            }
        }
    }

    let fields = leftover_fields(object, &shared, table.key)?;
    Ok(Decoded {
        shared,
        kind: (table.fallback)(UnknownVariant { tag, fields }),
        extra: Map::new(),
    })
}

/// Re-assembles a content object from shared fields, a variant, and the
/// untyped keys. Typed keys win over `extra` entries of the same name.
pub(crate) fn encode<C, K>(
    shared: &C,
    key: &str,
    kind: &K,
    extra: &Map<String, Value>,
) -> Result<Value, serde_json::Error>
where
    C: Serialize,
    K: Variant,
{
    let mut object = match serde_json::to_value(shared)? {
        Value::Object(object) => object,
        _ => return Err(serde_json::Error::custom("shared fields must encode as an object")),
    };
    object.insert(key.to_owned(), Value::String(kind.tag().to_owned()));
    match kind.fields()? {
        Value::Object(fields) => object.extend(fields),
        Value::Null => {}
        _ => return Err(serde_json::Error::custom("variant fields must encode as an object")),
    }
    for (name, value) in extra {
        object.entry(name.clone()).or_insert_with(|| value.clone());
    }
    Ok(Value::Object(object))
}

/// Feeds an already-built JSON value to a serde serializer.
pub(crate) fn serialize_value<S: Serializer>(
    value: Result<Value, serde_json::Error>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    value
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}

fn leftover_fields<C: Serialize>(
    mut object: Map<String, Value>,
    shared: &C,
    key: &str,
) -> Result<Map<String, Value>, serde_json::Error> {
    object.remove(key);
    if let Value::Object(shared) = serde_json::to_value(shared)? {
        for shared_key in shared.keys() {
            object.remove(shared_key);
        }
    }
    Ok(object)
}
