//! Event decoding for the Matrix client-server API.
//!
//! This crate turns arbitrary event JSON into typed values:
//!
//! - **Envelope** ([`EventEnvelope`]): the wrapper fields every event
//!   shares, with `content` still raw.
//! - **Registry** ([`resolve`], [`EventContent`]): the event `type` to
//!   content schema table, including the nested `msgtype`, `algorithm`,
//!   `method`, and `action` families in [`content`].
//! - **Classification** ([`Event`]): state vs timeline, decided by
//!   `state_key`, with `prev_content` resolved alongside `content`.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, events out.
//!
//! Decoding is total: the only error for well-formed JSON is an envelope
//! without a string `type`. Unknown event types and unknown nested variants
//! decode to fallback values that keep the original JSON.
//!
//! ```text
//! JSON → EventEnvelope → (type, raw content) → EventContent → Event
//! ```

mod codec;
pub mod content;
pub mod envelope;
mod error;
mod event;
mod registry;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use content::{OpaqueContent, UnknownVariant};
pub use envelope::EventEnvelope;
pub use error::EventError;
pub use event::{Event, EventMeta, StateEvent, TimelineEvent};
pub use registry::{EventContent, is_registered, registered_count, resolve};

use serde_json::Value;

/// Decodes and classifies one JSON event.
///
/// # Errors
/// Returns [`EventError::MalformedEnvelope`] if `value` is not an object
/// with a string `type`.
pub fn decode_event(value: Value) -> Result<Event, EventError> {
    Event::from_json(value)
}

/// Parses bytes as JSON, then decodes one event.
///
/// # Errors
/// Returns [`EventError::Decode`] for invalid JSON and
/// [`EventError::MalformedEnvelope`] for a non-event value.
pub fn decode_event_slice(bytes: &[u8]) -> Result<Event, EventError> {
    let value = serde_json::from_slice(bytes).map_err(EventError::Decode)?;
    decode_event(value)
}
