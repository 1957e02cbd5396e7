//! Event arrays through the single-event decoder.

use lattice_events::Event;
use lattice_events::envelope::json_kind;
use serde_json::Value;

use crate::{BatchConfig, MalformedPolicy, SyncError};

/// Decodes a JSON array of events, such as a `/state` dump or a
/// `/messages` chunk.
///
/// Entries that are not valid envelopes are handled per
/// [`BatchConfig::on_malformed`]. Unrecognized event types are not
/// malformed; they decode to opaque content like any single event.
///
/// # Errors
/// - [`SyncError::InvalidPayload`] if `events` is not an array.
/// - [`SyncError::MalformedEvent`] under [`MalformedPolicy::Fail`].
pub fn decode_events(events: Value, config: &BatchConfig) -> Result<Vec<Event>, SyncError> {
    match events {
        Value::Array(items) => decode_section(items, "events", None, config),
        other => Err(SyncError::invalid(format!(
            "expected an array of events, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decodes one array of a larger payload.
///
/// `section` names the array in logs and errors. `room_id` is the room the
/// section belongs to, if any.
pub(crate) fn decode_section(
    items: Vec<Value>,
    section: &str,
    room_id: Option<&str>,
    config: &BatchConfig,
) -> Result<Vec<Event>, SyncError> {
    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match Event::from_json(item) {
            Ok(mut event) => {
                if config.attach_room_id {
                    if let Some(room_id) = room_id {
                        let meta = event.meta_mut();
                        if meta.room_id.is_none() {
                            meta.room_id = Some(room_id.to_owned());
                        }
                    }
                }
                events.push(event);
            }
            Err(source) => match config.on_malformed {
                MalformedPolicy::Skip => {
                    tracing::warn!(section, index, error = %source, "skipping malformed event");
                }
                MalformedPolicy::Fail => {
                    return Err(SyncError::MalformedEvent {
                        section: section.to_owned(),
                        index,
                        source,
                    });
                }
            },
        }
    }
    Ok(events)
}
