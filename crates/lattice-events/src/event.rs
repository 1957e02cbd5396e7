//! State/timeline classification.
//!
//! `state_key` alone decides the category: any string (including `""`) makes
//! a state event; absent or `null` makes a timeline event. `prev_content` on
//! a state event is resolved with the same `type` as `content`, and the two
//! are never partially typed: if either one falls back to opaque, both do.
//!
//! The same classification applies to persisted room events and to
//! ephemeral or to-device events that carry no room metadata.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::content::OpaqueContent;
use crate::envelope::{self, EventEnvelope};
use crate::registry::{self, EventContent};
use crate::EventError;

/// Envelope metadata shared by both event categories.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventMeta {
    pub event_id: Option<String>,
    pub sender: Option<String>,
    pub origin_server_ts: Option<u64>,
    pub room_id: Option<String>,
    pub unsigned: Option<Value>,
    /// Top-level keys outside the envelope schema, verbatim.
    pub extra: Map<String, Value>,
}

impl EventMeta {
    /// Returns `true` if every field of a persisted room event is present.
    pub fn is_room_event(&self) -> bool {
        self.event_id.is_some()
            && self.room_id.is_some()
            && self.sender.is_some()
            && self.origin_server_ts.is_some()
    }
}

/// An event without a `state_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEvent {
    pub meta: EventMeta,
    pub content: EventContent,
}

/// An event with a `state_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEvent {
    pub meta: EventMeta,
    pub state_key: String,
    pub content: EventContent,
    /// Content of the state this event replaced, if the server sent it.
    pub prev_content: Option<EventContent>,
}

/// A decoded event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Timeline(TimelineEvent),
    State(StateEvent),
}

impl Event {
    /// Classifies an envelope and resolves its content.
    pub fn from_envelope(envelope: EventEnvelope) -> Self {
        let EventEnvelope {
            event_type,
            content,
            event_id,
            sender,
            origin_server_ts,
            unsigned,
            room_id,
            state_key,
            prev_content,
            mut extra,
        } = envelope;

        let mut meta = EventMeta {
            event_id,
            sender,
            origin_server_ts,
            room_id,
            unsigned,
            extra: Map::new(),
        };

        match state_key {
            Some(state_key) => {
                let (content, prev_content) = resolve_pair(&event_type, content, prev_content);
                meta.extra = extra;
                Self::State(StateEvent {
                    meta,
                    state_key,
                    content,
                    prev_content,
                })
            }
            None => {
                // Only state events carry a meaningful previous state.
                if let Some(prev_content) = prev_content {
                    extra.insert(envelope::PREV_CONTENT.to_owned(), prev_content);
                }
                meta.extra = extra;
                Self::Timeline(TimelineEvent {
                    meta,
                    content: registry::resolve(&event_type, content),
                })
            }
        }
    }

    /// Parses and classifies a JSON event.
    ///
    /// # Errors
    /// Returns [`EventError::MalformedEnvelope`] if the envelope is invalid.
    pub fn from_json(value: Value) -> Result<Self, EventError> {
        EventEnvelope::from_json(value).map(Self::from_envelope)
    }

    /// The event's `type`, taken from its content.
    pub fn event_type(&self) -> &str {
        self.content().event_type()
    }

    /// Decoded content. Unregistered types come back as
    /// [`EventContent::Opaque`].
    pub fn content(&self) -> &EventContent {
        match self {
            Self::Timeline(event) => &event.content,
            Self::State(event) => &event.content,
        }
    }

    /// Envelope fields shared by both shapes.
    pub fn meta(&self) -> &EventMeta {
        match self {
            Self::Timeline(event) => &event.meta,
            Self::State(event) => &event.meta,
        }
    }

    /// Mutable access to the envelope fields, e.g. to fill in a `room_id`
    /// that a sync response left implicit.
    pub fn meta_mut(&mut self) -> &mut EventMeta {
        match self {
            Self::Timeline(event) => &mut event.meta,
            Self::State(event) => &mut event.meta,
        }
    }

    /// The state key, or `None` for a timeline event. An empty string is a
    /// valid state key and is returned as `Some("")`.
    ///
    /// ```rust
    /// use lattice_events::Event;
    /// use serde_json::json;
    ///
    /// let state = Event::from_json(json!({
    ///     "type": "m.room.name",
    ///     "state_key": "",
    ///     "content": {"name": "Lobby"}
    /// }))
    /// .unwrap();
    /// assert_eq!(state.state_key(), Some(""));
    ///
    /// let timeline = Event::from_json(json!({"type": "m.reaction", "content": {}})).unwrap();
    /// assert_eq!(timeline.state_key(), None);
    /// ```
    pub fn state_key(&self) -> Option<&str> {
        match self {
            Self::Timeline(_) => None,
            Self::State(event) => Some(&event.state_key),
        }
    }

    /// Content this state event replaced, decoded under the same `type`.
    /// Always `None` for timeline events, which keep any `prev_content`
    /// in their extra fields instead.
    pub fn prev_content(&self) -> Option<&EventContent> {
        match self {
            Self::Timeline(_) => None,
            Self::State(event) => event.prev_content.as_ref(),
        }
    }

    /// Returns `true` if the event carried a `state_key`.
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State(_))
    }

    /// See [`EventMeta::is_room_event`].
    pub fn is_room_event(&self) -> bool {
        self.meta().is_room_event()
    }

    /// Converts the event back into an envelope with raw JSON content.
    ///
    /// # Errors
    /// Returns [`EventError::Encode`] if typed content cannot be encoded.
    pub fn into_envelope(self) -> Result<EventEnvelope, EventError> {
        let (meta, state_key, content, prev_content) = match self {
            Self::Timeline(event) => (event.meta, None, event.content, None),
            Self::State(event) => (
                event.meta,
                Some(event.state_key),
                event.content,
                event.prev_content,
            ),
        };
        let mut envelope = EventEnvelope::new(content.event_type(), content.to_json()?);
        envelope.event_id = meta.event_id;
        envelope.sender = meta.sender;
        envelope.origin_server_ts = meta.origin_server_ts;
        envelope.unsigned = meta.unsigned;
        envelope.room_id = meta.room_id;
        envelope.state_key = state_key;
        envelope.prev_content = prev_content.map(|prev| prev.to_json()).transpose()?;
        envelope.extra = meta.extra;
        Ok(envelope)
    }

    /// Encodes the full event.
    ///
    /// # Errors
    /// Returns [`EventError::Encode`] if typed content cannot be encoded.
    pub fn to_json(&self) -> Result<Value, EventError> {
        Ok(self.clone().into_envelope()?.to_json())
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Resolves `content` and `prev_content` under one type tag.
fn resolve_pair(
    event_type: &str,
    content: Value,
    prev_content: Option<Value>,
) -> (EventContent, Option<EventContent>) {
    let typed = registry::try_resolve(event_type, &content);
    let Some(prev_content) = prev_content else {
        let content = typed
            .unwrap_or_else(|| EventContent::Opaque(OpaqueContent::new(event_type, content)));
        return (content, None);
    };

    match (typed, registry::try_resolve(event_type, &prev_content)) {
        (Some(typed), Some(prev_typed)) => (typed, Some(prev_typed)),
        _ => (
            EventContent::Opaque(OpaqueContent::new(event_type, content)),
            Some(EventContent::Opaque(OpaqueContent::new(
                event_type,
                prev_content,
            ))),
        ),
    }
}
