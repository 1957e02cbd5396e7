//! Incremental sync payloads.
//!
//! A sync response groups events by where they belong: per joined, invited,
//! or left room, then by category (state, timeline, ephemeral, room account
//! data, stripped invite state), plus the global presence, account data,
//! and to-device lists. Every event array goes through the same
//! single-event decoder as [`decode_events`](crate::decode_events).
//!
//! Sections that are absent or `null` decode as empty. A section with the
//! wrong JSON shape is a [`SyncError::InvalidPayload`]: that is a broken
//! container, not a broken event.

use std::collections::BTreeMap;

use lattice_events::Event;
use lattice_events::envelope::json_kind;
use serde_json::{Map, Value};

use crate::batch::decode_section;
use crate::{BatchConfig, SyncError};

const EVENTS: &str = "events";

/// A decoded `/sync` response body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncResponse {
    /// Token to pass as `since` on the next request.
    pub next_batch: String,
    pub rooms: Rooms,
    pub presence: Vec<Event>,
    /// Global account data.
    pub account_data: Vec<Event>,
    pub to_device: Vec<Event>,
}

/// Rooms by membership, keyed by room id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rooms {
    pub join: BTreeMap<String, JoinedRoom>,
    pub invite: BTreeMap<String, InvitedRoom>,
    pub leave: BTreeMap<String, LeftRoom>,
}

/// Updates to a room the user is joined to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedRoom {
    /// State between the previous sync and the start of `timeline`.
    pub state: Vec<Event>,
    pub timeline: Timeline,
    /// Typing notifications and receipts.
    pub ephemeral: Vec<Event>,
    /// Room-scoped account data (tags, fully-read markers).
    pub account_data: Vec<Event>,
}

/// A room the user has been invited to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvitedRoom {
    /// Stripped state events describing the room.
    pub invite_state: Vec<Event>,
}

/// A room the user has left or been removed from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeftRoom {
    pub state: Vec<Event>,
    pub timeline: Timeline,
    pub account_data: Vec<Event>,
}

/// A slice of a room's timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    pub events: Vec<Event>,
    /// `true` if events were omitted between the previous sync and this one.
    pub limited: bool,
    /// Token for paginating backwards from the start of `events`.
    pub prev_batch: Option<String>,
}

impl SyncResponse {
    /// Decodes a sync response body.
    ///
    /// # Errors
    /// - [`SyncError::InvalidPayload`] if the body is not an object, lacks a
    ///   string `next_batch`, or has a section of the wrong shape.
    /// - [`SyncError::MalformedEvent`] under
    ///   [`MalformedPolicy::Fail`](crate::MalformedPolicy::Fail).
    pub fn from_json(value: Value, config: &BatchConfig) -> Result<Self, SyncError> {
        let mut root = expect_object(value, "sync response")?;

        let next_batch = match root.remove("next_batch") {
            Some(Value::String(token)) => token,
            Some(other) => {
                return Err(SyncError::invalid(format!(
                    "`next_batch` must be a string, got {}",
                    json_kind(&other)
                )));
            }
            None => return Err(SyncError::invalid("missing `next_batch`")),
        };

        let rooms = match root.remove("rooms") {
            None | Some(Value::Null) => Rooms::default(),
            Some(rooms) => Rooms::from_json(expect_object(rooms, "rooms")?, config)?,
        };

        let response = Self {
            next_batch,
            rooms,
            presence: section_events(&mut root, "presence", "", None, config)?,
            account_data: section_events(&mut root, "account_data", "", None, config)?,
            to_device: section_events(&mut root, "to_device", "", None, config)?,
        };

        tracing::debug!(
            next_batch = %response.next_batch,
            joined = response.rooms.join.len(),
            invited = response.rooms.invite.len(),
            left = response.rooms.leave.len(),
            to_device = response.to_device.len(),
            "decoded sync response"
        );
        Ok(response)
    }

    /// Parses bytes as JSON, then decodes a sync response.
    ///
    /// # Errors
    /// [`SyncError::InvalidPayload`] for invalid JSON, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn from_slice(bytes: &[u8], config: &BatchConfig) -> Result<Self, SyncError> {
        let value = serde_json::from_slice(bytes)
            .map_err(|e| SyncError::invalid(format!("body is not JSON: {e}")))?;
        Self::from_json(value, config)
    }

    /// Total number of decoded events across every section.
    pub fn event_count(&self) -> usize {
        let joined: usize = self
            .rooms
            .join
            .values()
            .map(|room| {
                room.state.len()
                    + room.timeline.events.len()
                    + room.ephemeral.len()
                    + room.account_data.len()
            })
            .sum();
        let invited: usize = self.rooms.invite.values().map(|room| room.invite_state.len()).sum();
        let left: usize = self
            .rooms
            .leave
            .values()
            .map(|room| room.state.len() + room.timeline.events.len() + room.account_data.len())
            .sum();
        joined
            + invited
            + left
            + self.presence.len()
            + self.account_data.len()
            + self.to_device.len()
    }
}

impl Rooms {
    fn from_json(mut rooms: Map<String, Value>, config: &BatchConfig) -> Result<Self, SyncError> {
        let mut decoded = Self::default();

        for (room_id, mut room) in room_sections(&mut rooms, "join")? {
            let path = format!("rooms.join.{room_id}");
            let id = Some(room_id.as_str());
            let joined = JoinedRoom {
                state: section_events(&mut room, "state", &path, id, config)?,
                timeline: timeline(&mut room, &path, id, config)?,
                ephemeral: section_events(&mut room, "ephemeral", &path, id, config)?,
                account_data: section_events(&mut room, "account_data", &path, id, config)?,
            };
            decoded.join.insert(room_id, joined);
        }

        for (room_id, mut room) in room_sections(&mut rooms, "invite")? {
            let path = format!("rooms.invite.{room_id}");
            let invited = InvitedRoom {
                invite_state: section_events(
                    &mut room,
                    "invite_state",
                    &path,
                    Some(&room_id),
                    config,
                )?,
            };
            decoded.invite.insert(room_id, invited);
        }

        for (room_id, mut room) in room_sections(&mut rooms, "leave")? {
            let path = format!("rooms.leave.{room_id}");
            let id = Some(room_id.as_str());
            let left = LeftRoom {
                state: section_events(&mut room, "state", &path, id, config)?,
                timeline: timeline(&mut room, &path, id, config)?,
                account_data: section_events(&mut room, "account_data", &path, id, config)?,
            };
            decoded.leave.insert(room_id, left);
        }

        Ok(decoded)
    }
}

// ---------------------------------------------------------------------------
// Section helpers
// ---------------------------------------------------------------------------

/// Splits `rooms.<key>` into `(room_id, room object)` pairs.
fn room_sections(
    rooms: &mut Map<String, Value>,
    key: &str,
) -> Result<Vec<(String, Map<String, Value>)>, SyncError> {
    let path = format!("rooms.{key}");
    match rooms.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(by_id)) => by_id
            .into_iter()
            .map(|(room_id, room)| -> Result<_, SyncError> {
                let room = expect_object(room, &format!("{path}.{room_id}"))?;
                Ok((room_id, room))
            })
            .collect(),
        Some(other) => Err(wrong_shape(&path, "an object", &other)),
    }
}

/// Decodes `parent[key].events`.
fn section_events(
    parent: &mut Map<String, Value>,
    key: &str,
    path: &str,
    room_id: Option<&str>,
    config: &BatchConfig,
) -> Result<Vec<Event>, SyncError> {
    let path = join_path(path, key);
    match parent.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(mut container)) => {
            let items = event_array(&mut container, &path)?;
            decode_section(items, &path, room_id, config)
        }
        Some(other) => Err(wrong_shape(&path, "an object", &other)),
    }
}

/// Decodes `parent.timeline`, including its pagination fields.
fn timeline(
    parent: &mut Map<String, Value>,
    path: &str,
    room_id: Option<&str>,
    config: &BatchConfig,
) -> Result<Timeline, SyncError> {
    let path = join_path(path, "timeline");
    match parent.remove("timeline") {
        None | Some(Value::Null) => Ok(Timeline::default()),
        Some(Value::Object(mut container)) => {
            let items = event_array(&mut container, &path)?;
            Ok(Timeline {
                events: decode_section(items, &path, room_id, config)?,
                limited: container
                    .get("limited")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                prev_batch: container
                    .get("prev_batch")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
            })
        }
        Some(other) => Err(wrong_shape(&path, "an object", &other)),
    }
}

fn event_array(container: &mut Map<String, Value>, path: &str) -> Result<Vec<Value>, SyncError> {
    match container.remove(EVENTS) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(wrong_shape(&join_path(path, EVENTS), "an array", &other)),
    }
}

fn expect_object(value: Value, path: &str) -> Result<Map<String, Value>, SyncError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(wrong_shape(path, "an object", &other)),
    }
}

fn wrong_shape(path: &str, expected: &str, found: &Value) -> SyncError {
    SyncError::invalid(format!(
        "`{path}` must be {expected}, got {}",
        json_kind(found)
    ))
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_minimal_sync() {
        let response =
            SyncResponse::from_json(json!({"next_batch": "s1"}), &BatchConfig::default()).unwrap();
        assert_eq!(response.next_batch, "s1");
        assert_eq!(response.event_count(), 0);
    }

    #[test]
    fn test_missing_next_batch() {
        let err = SyncResponse::from_json(json!({"rooms": {}}), &BatchConfig::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload(ref reason) if reason == "missing `next_batch`"));
    }

    #[test]
    fn test_non_object_payload() {
        let err = SyncResponse::from_json(json!([]), &BatchConfig::default()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload(_)));
    }

    #[test]
    fn test_wrong_shaped_section_names_path() {
        let err = SyncResponse::from_json(
            json!({"next_batch": "s", "rooms": {"join": {"!r:x": {"state": {"events": 3}}}}}),
            &BatchConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid sync payload: `rooms.join.!r:x.state.events` must be an array, got a number"
        );
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "presence"), "presence");
        assert_eq!(join_path("rooms.join.!r", "state"), "rooms.join.!r.state");
    }
}
