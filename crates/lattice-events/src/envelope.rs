//! The event envelope: the wrapper fields every event shares.
//!
//! [`EventEnvelope::from_json`] pulls the well-known top-level keys out of a
//! JSON object and leaves `content` and `prev_content` as raw JSON for the
//! registry to resolve later. The only hard requirement is a string `type`.
//! Every other key is optional, and a key whose value has an unexpected JSON
//! type (including an explicit `null`) is treated as absent and kept verbatim
//! in [`EventEnvelope::extra`], so re-encoding reproduces the input.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::EventError;

// ---------------------------------------------------------------------------
// Wire keys
// ---------------------------------------------------------------------------

pub const TYPE: &str = "type";
pub const CONTENT: &str = "content";
pub const EVENT_ID: &str = "event_id";
pub const SENDER: &str = "sender";
pub const ORIGIN_SERVER_TS: &str = "origin_server_ts";
pub const UNSIGNED: &str = "unsigned";
pub const ROOM_ID: &str = "room_id";
pub const STATE_KEY: &str = "state_key";
pub const PREV_CONTENT: &str = "prev_content";

// ---------------------------------------------------------------------------
// EventEnvelope
// ---------------------------------------------------------------------------

/// An event with its content still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// The `type` discriminator.
    pub event_type: String,
    /// Raw `content`. `Value::Null` when the key is absent.
    pub content: Value,
    pub event_id: Option<String>,
    pub sender: Option<String>,
    /// Milliseconds since the epoch on the originating server.
    pub origin_server_ts: Option<u64>,
    /// Server-added data not covered by signatures (`age`,
    /// `transaction_id`, `redacted_because`, ...).
    pub unsigned: Option<Value>,
    pub room_id: Option<String>,
    /// `Some` for state events. May be the empty string.
    pub state_key: Option<String>,
    /// Raw content of the state this event replaced.
    pub prev_content: Option<Value>,
    /// Every other top-level key, verbatim.
    pub extra: Map<String, Value>,
}

impl EventEnvelope {
    /// An envelope with only `type` and `content` set.
    pub fn new(event_type: impl Into<String>, content: Value) -> Self {
        Self {
            event_type: event_type.into(),
            content,
            event_id: None,
            sender: None,
            origin_server_ts: None,
            unsigned: None,
            room_id: None,
            state_key: None,
            prev_content: None,
            extra: Map::new(),
        }
    }

    /// Parses the envelope fields of a JSON event.
    ///
    /// # Errors
    /// Returns [`EventError::MalformedEnvelope`] if `value` is not an object
    /// or its `type` is missing or not a string.
    pub fn from_json(value: Value) -> Result<Self, EventError> {
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(EventError::malformed(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )));
            }
        };

        let event_type = match object.remove(TYPE) {
            Some(Value::String(event_type)) => event_type,
            Some(other) => {
                return Err(EventError::malformed(format!(
                    "`type` must be a string, got {}",
                    json_kind(&other)
                )));
            }
            None => return Err(EventError::malformed("missing `type`")),
        };

        let content = match object.remove(CONTENT) {
            Some(Value::Null) => {
                object.insert(CONTENT.to_owned(), Value::Null);
                Value::Null
            }
            Some(content) => content,
            None => Value::Null,
        };

        Ok(Self {
            event_type,
            content,
            event_id: take_string(&mut object, EVENT_ID),
            sender: take_string(&mut object, SENDER),
            origin_server_ts: take_u64(&mut object, ORIGIN_SERVER_TS),
            unsigned: take_object(&mut object, UNSIGNED),
            room_id: take_string(&mut object, ROOM_ID),
            state_key: take_string(&mut object, STATE_KEY),
            prev_content: take_non_null(&mut object, PREV_CONTENT),
            extra: object,
        })
    }

    /// Encodes the envelope with its wire key names.
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    /// Returns `true` if `state_key` is present.
    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut object = self.extra.clone();
        object.insert(TYPE.to_owned(), Value::String(self.event_type.clone()));
        if !self.content.is_null() {
            object.insert(CONTENT.to_owned(), self.content.clone());
        }
        put(&mut object, EVENT_ID, self.event_id.clone().map(Value::String));
        put(&mut object, SENDER, self.sender.clone().map(Value::String));
        put(&mut object, ORIGIN_SERVER_TS, self.origin_server_ts.map(Value::from));
        put(&mut object, UNSIGNED, self.unsigned.clone());
        put(&mut object, ROOM_ID, self.room_id.clone().map(Value::String));
        put(&mut object, STATE_KEY, self.state_key.clone().map(Value::String));
        put(&mut object, PREV_CONTENT, self.prev_content.clone());
        object
    }
}

impl Serialize for EventEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Removes `key` if it holds a string. Anything else stays in `object`.
pub(crate) fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key) {
        Some(Value::String(_)) => match object.remove(key) {
            Some(Value::String(value)) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

/// Removes `key` if it holds a non-negative integer.
pub(crate) fn take_u64(object: &mut Map<String, Value>, key: &str) -> Option<u64> {
    let value = object.get(key).and_then(Value::as_u64)?;
    object.remove(key);
    Some(value)
}

fn take_object(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    if object.get(key).is_some_and(Value::is_object) {
        object.remove(key)
    } else {
        None
    }
}

fn take_non_null(object: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(_) => object.remove(key),
    }
}

fn put(object: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        object.insert(key.to_owned(), value);
    }
}

/// Name of a JSON value's type, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
