//! Integration tests for sync payload decoding.

use lattice_events::EventContent;
use lattice_sync::{BatchConfig, MalformedPolicy, SyncError, SyncResponse, decode_events};
use serde_json::{Value, json};

// =========================================================================
// Fixture: a realistic incremental sync body.
// =========================================================================

fn sync_body() -> Value {
    json!({
        "next_batch": "s72595_4483_1934",
        "presence": {
            "events": [{
                "type": "m.presence",
                "sender": "@alice:example.org",
                "content": {"presence": "online", "last_active_ago": 2478593}
            }]
        },
        "account_data": {
            "events": [{
                "type": "m.ignored_user_list",
                "content": {"ignored_users": {"@troll:example.org": {}}}
            }]
        },
        "to_device": {
            "events": [{
                "type": "m.room_key_request",
                "sender": "@alice:example.org",
                "content": {
                    "action": "request_cancellation",
                    "requesting_device_id": "DEV",
                    "request_id": "1"
                }
            }]
        },
        "rooms": {
            "join": {
                "!726s6s6q:example.com": {
                    "state": {
                        "events": [{
                            "type": "m.room.member",
                            "state_key": "@alice:example.org",
                            "event_id": "$member",
                            "sender": "@alice:example.org",
                            "origin_server_ts": 1432735824653_u64,
                            "content": {"membership": "join"}
                        }]
                    },
                    "timeline": {
                        "events": [
                            {
                                "type": "m.room.message",
                                "event_id": "$msg",
                                "sender": "@bob:example.org",
                                "origin_server_ts": 1432735824654_u64,
                                "content": {"msgtype": "m.text", "body": "hello"}
                            },
                            {"content": {"type": "missing"}}
                        ],
                        "limited": true,
                        "prev_batch": "t34-23535_0_0"
                    },
                    "ephemeral": {
                        "events": [{
                            "type": "m.typing",
                            "content": {"user_ids": ["@bob:example.org"]}
                        }]
                    },
                    "account_data": {
                        "events": [{
                            "type": "m.tag",
                            "content": {"tags": {"u.work": {"order": 0.9}}}
                        }]
                    }
                }
            },
            "invite": {
                "!696r7674:example.com": {
                    "invite_state": {
                        "events": [{
                            "type": "m.room.name",
                            "state_key": "",
                            "sender": "@carol:example.org",
                            "content": {"name": "My Room Name"}
                        }]
                    }
                }
            },
            "leave": {
                "!gone:example.com": {
                    "timeline": {"events": []}
                }
            }
        }
    })
}

// =========================================================================
// Grouping
// =========================================================================

#[test]
fn test_sync_groups_by_room_and_category() {
    let response = SyncResponse::from_json(sync_body(), &BatchConfig::default()).unwrap();
    assert_eq!(response.next_batch, "s72595_4483_1934");

    let room = &response.rooms.join["!726s6s6q:example.com"];
    assert_eq!(room.state.len(), 1);
    assert!(room.state[0].is_state());
    assert_eq!(room.timeline.events.len(), 1);
    assert!(room.timeline.limited);
    assert_eq!(room.timeline.prev_batch.as_deref(), Some("t34-23535_0_0"));
    assert!(matches!(room.ephemeral[0].content(), EventContent::Typing(_)));
    assert!(matches!(room.account_data[0].content(), EventContent::Tag(_)));

    let invited = &response.rooms.invite["!696r7674:example.com"];
    assert!(matches!(invited.invite_state[0].content(), EventContent::RoomName(_)));

    let left = &response.rooms.leave["!gone:example.com"];
    assert!(left.timeline.events.is_empty());
    assert!(!left.timeline.limited);

    assert!(matches!(response.presence[0].content(), EventContent::Presence(_)));
    assert!(matches!(response.account_data[0].content(), EventContent::IgnoredUserList(_)));
    assert!(matches!(response.to_device[0].content(), EventContent::RoomKeyRequest(_)));
    assert_eq!(response.event_count(), 8);
}

#[test]
fn test_room_id_attached_to_room_sections() {
    let response = SyncResponse::from_json(sync_body(), &BatchConfig::default()).unwrap();
    let room = &response.rooms.join["!726s6s6q:example.com"];
    assert_eq!(room.timeline.events[0].meta().room_id.as_deref(), Some("!726s6s6q:example.com"));
    assert_eq!(room.ephemeral[0].meta().room_id.as_deref(), Some("!726s6s6q:example.com"));
    assert!(room.timeline.events[0].is_room_event());
    assert_eq!(response.presence[0].meta().room_id, None);
}

#[test]
fn test_room_id_attachment_can_be_disabled() {
    let config = BatchConfig {
        attach_room_id: false,
        ..BatchConfig::default()
    };
    let response = SyncResponse::from_json(sync_body(), &config).unwrap();
    let room = &response.rooms.join["!726s6s6q:example.com"];
    assert_eq!(room.ephemeral[0].meta().room_id, None);
}

// =========================================================================
// Malformed entries
// =========================================================================

#[test]
fn test_strict_policy_fails_with_section_and_index() {
    let err = SyncResponse::from_json(sync_body(), &BatchConfig::strict()).unwrap_err();
    let SyncError::MalformedEvent { section, index, source } = err else {
        panic!("expected MalformedEvent");
    };
    assert_eq!(section, "rooms.join.!726s6s6q:example.com.timeline");
    assert_eq!(index, 1);
    assert!(source.is_malformed_envelope());
}

#[test]
fn test_state_dump_decoding() {
    let dump = json!([
        {"type": "m.room.create", "state_key": "", "content": {"creator": "@a:x", "room_version": "10"}},
        {"type": "m.room.power_levels", "state_key": "", "content": {"users": {"@a:x": 100}}},
        42
    ]);
    let events = decode_events(dump.clone(), &BatchConfig::default()).unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.is_state()));

    let config = BatchConfig {
        on_malformed: MalformedPolicy::Fail,
        attach_room_id: true,
    };
    assert!(decode_events(dump, &config).is_err());
}
