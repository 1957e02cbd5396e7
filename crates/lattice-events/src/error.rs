//! Error types for the event layer.
//!
//! Only structurally invalid input produces an [`EventError`]. Content that
//! is well-formed JSON but unrecognized (a new event type, a new `msgtype`)
//! is never an error: it decodes to an opaque or fallback value instead.

/// Errors that can occur while decoding or encoding events.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The input does not satisfy the minimal envelope shape.
    ///
    /// Raised when the value is not a JSON object, or when `type` is
    /// missing or not a string. Fatal for that one decode: the peer sent
    /// something that is not an event at all.
    #[error("malformed event envelope: {0}")]
    MalformedEnvelope(String),

    /// The raw bytes were not valid JSON.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A typed value could not be turned back into JSON.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),
}

impl EventError {
    /// Shorthand for building a [`EventError::MalformedEnvelope`].
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope(reason.into())
    }

    /// Returns `true` if the input violated the envelope contract.
    pub fn is_malformed_envelope(&self) -> bool {
        matches!(self, Self::MalformedEnvelope(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_envelope_display_includes_reason() {
        let err = EventError::malformed("missing `type`");
        assert_eq!(err.to_string(), "malformed event envelope: missing `type`");
        assert!(err.is_malformed_envelope());
    }

    #[test]
    fn test_decode_error_is_not_malformed_envelope() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = EventError::Decode(json_err);
        assert!(!err.is_malformed_envelope());
        assert!(err.to_string().starts_with("decode failed"));
    }
}
