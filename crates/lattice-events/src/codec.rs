//! Codec trait and implementations for turning bytes into events.
//!
//! The event layer works on `serde_json::Value`; a [`Codec`] is what sits
//! between raw response bodies and that value. [`JsonCodec`] is the only
//! wire format the protocol defines, and lives behind the default `json`
//! feature.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Event, EventError};

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` so one codec can be shared by every thread that
/// decodes responses.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `EventError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, EventError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `EventError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, EventError>;

    /// Decodes and classifies a single event.
    ///
    /// # Errors
    /// Returns `EventError::Decode` for unparseable bytes and
    /// `EventError::MalformedEnvelope` for a value that is not an event.
    fn decode_event(&self, data: &[u8]) -> Result<Event, EventError> {
        let value: Value = self.decode(data)?;
        Event::from_json(value)
    }

    /// Encodes an event with its wire key names.
    ///
    /// # Errors
    /// Returns `EventError::Encode` if the content cannot be encoded.
    fn encode_event(&self, event: &Event) -> Result<Vec<u8>, EventError> {
        self.encode(&event.to_json()?)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use lattice_events::{Codec, EventContent, JsonCodec};
///
/// let codec = JsonCodec;
/// let event = codec
///     .decode_event(br#"{"type":"m.room.name","state_key":"","content":{"name":"Lobby"}}"#)
///     .unwrap();
///
/// assert!(event.is_state());
/// assert!(matches!(event.content(), EventContent::RoomName(_)));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(value).map_err(EventError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, EventError> {
        serde_json::from_slice(data).map_err(EventError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_invalid_bytes() {
        let err = JsonCodec.decode_event(b"{not json").unwrap_err();
        assert!(matches!(err, EventError::Decode(_)));
    }

    #[test]
    fn test_decode_non_event_json() {
        let err = JsonCodec.decode_event(b"[1, 2, 3]").unwrap_err();
        assert!(err.is_malformed_envelope());
    }

    #[test]
    fn test_encode_event_round_trip() {
        let input = json!({
            "type": "m.room.member",
            "state_key": "@bob:example.org",
            "content": {"membership": "invite"},
            "sender": "@alice:example.org"
        });
        let bytes = serde_json::to_vec(&input).unwrap();
        let event = JsonCodec.decode_event(&bytes).unwrap();
        let encoded = JsonCodec.encode_event(&event).unwrap();
        let value: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(value, input);
    }
}
