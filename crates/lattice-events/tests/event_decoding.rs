//! Integration tests for envelope parsing, content dispatch, and
//! state/timeline classification.

use lattice_events::content::encryption::{EncryptedScheme, KeyRequestAction};
use lattice_events::content::message::MessageKind;
use lattice_events::content::room::Membership;
use lattice_events::content::verification::StartMethod;
use lattice_events::{Event, EventContent, decode_event, decode_event_slice};
use serde_json::{Value, json};

fn round_trip(input: Value) -> Event {
    let event = decode_event(input.clone()).unwrap();
    assert_eq!(event.to_json().unwrap(), input, "re-encoding changed the event");
    event
}

// =========================================================================
// Round-trip and omission
// =========================================================================

#[test]
fn test_member_event_round_trip() {
    let event = round_trip(json!({
        "type": "m.room.member",
        "event_id": "$join:example.org",
        "room_id": "!room:example.org",
        "sender": "@alice:example.org",
        "origin_server_ts": 1_432_735_824_653_u64,
        "state_key": "@alice:example.org",
        "unsigned": {"age": 1234},
        "content": {
            "membership": "join",
            "displayname": "Alice",
            "avatar_url": "mxc://example.org/abc"
        }
    }));
    let EventContent::RoomMember(member) = event.content() else {
        panic!("expected m.room.member");
    };
    assert_eq!(member.membership, Membership::Join);
    assert!(event.is_room_event());
}

#[test]
fn test_member_event_with_cleared_profile_round_trips() {
    let event = round_trip(json!({
        "type": "m.room.member",
        "state_key": "@bob:example.org",
        "content": {"membership": "join", "displayname": null, "avatar_url": null}
    }));
    let EventContent::RoomMember(member) = event.content() else {
        panic!("expected m.room.member");
    };
    assert_eq!(member.displayname, None);
    assert_eq!(member.avatar_url, None);
}

#[test]
fn test_message_mentions_round_trip() {
    let event = round_trip(json!({
        "type": "m.room.message",
        "room_id": "!room:example.org",
        "content": {
            "msgtype": "m.text",
            "body": "hi",
            "m.mentions": {"user_ids": ["@b:c"]}
        }
    }));
    let EventContent::RoomMessage(message) = event.content() else {
        panic!("expected m.room.message");
    };
    assert!(matches!(message.kind, MessageKind::Text(_)));
    assert_eq!(message.extra["m.mentions"]["user_ids"][0], "@b:c");
}

#[test]
fn test_power_levels_defaults_not_materialized() {
    let event = round_trip(json!({
        "type": "m.room.power_levels",
        "state_key": "",
        "content": {"users": {"@alice:example.org": 100}}
    }));
    let EventContent::RoomPowerLevels(levels) = event.content() else {
        panic!("expected m.room.power_levels");
    };
    assert_eq!(levels.ban(), 50);
    assert_eq!(levels.user_level("@alice:example.org"), 100);
    assert_eq!(levels.user_level("@bob:example.org"), 0);
}

#[test]
fn test_typing_without_user_ids_round_trips() {
    let event = round_trip(json!({
        "type": "m.typing",
        "room_id": "!room:example.org",
        "content": {}
    }));
    let EventContent::Typing(typing) = event.content() else {
        panic!("expected m.typing");
    };
    assert!(typing.user_ids().is_empty());
}

#[test]
fn test_unknown_top_level_keys_survive() {
    round_trip(json!({
        "type": "m.room.message",
        "content": {"msgtype": "m.text", "body": "hi"},
        "age": 5,
        "org.example.annotation": {"nested": [1, 2]}
    }));
}

// =========================================================================
// Unknown-type fallback
// =========================================================================

#[test]
fn test_unknown_event_type_is_opaque_and_round_trips() {
    let event = round_trip(json!({
        "type": "com.example.game.move",
        "sender": "@alice:example.org",
        "content": {"x": 3, "y": 4}
    }));
    let opaque = event.content().as_opaque().unwrap();
    assert_eq!(opaque.event_type, "com.example.game.move");
    assert_eq!(opaque.get("x"), Some(&json!(3)));
}

#[test]
fn test_malformed_known_content_is_opaque() {
    let event = round_trip(json!({
        "type": "m.room.name",
        "state_key": "",
        "content": {"name": ["not", "a", "string"]}
    }));
    assert!(event.content().is_opaque());
    assert!(event.is_state());
}

// =========================================================================
// Nested discriminators
// =========================================================================

#[test]
fn test_image_message_dispatch() {
    let event = round_trip(json!({
        "type": "m.room.message",
        "content": {
            "msgtype": "m.image",
            "body": "cat.png",
            "url": "mxc://example.org/cat",
            "info": {"w": 640, "h": 480, "mimetype": "image/png"}
        }
    }));
    let EventContent::RoomMessage(message) = event.content() else {
        panic!("expected m.room.message");
    };
    assert!(matches!(message.kind, MessageKind::Image(_)));
    assert_eq!(message.msgtype(), "m.image");
}

#[test]
fn test_unknown_msgtype_keeps_body_and_fields() {
    let event = round_trip(json!({
        "type": "m.room.message",
        "content": {
            "msgtype": "org.example.poll",
            "body": "Lunch?",
            "options": ["pizza", "sushi"]
        }
    }));
    let EventContent::RoomMessage(message) = event.content() else {
        panic!("expected m.room.message");
    };
    assert_eq!(message.body, "Lunch?");
    let MessageKind::Unknown(unknown) = &message.kind else {
        panic!("expected unknown msgtype");
    };
    assert_eq!(unknown.tag, "org.example.poll");
    assert_eq!(unknown.get("options"), Some(&json!(["pizza", "sushi"])));
    assert!(unknown.get("body").is_none());
}

#[test]
fn test_megolm_encrypted_dispatch() {
    let event = round_trip(json!({
        "type": "m.room.encrypted",
        "content": {
            "algorithm": "m.megolm.v1.aes-sha2",
            "sender_key": "curve",
            "ciphertext": "AwgAEn",
            "session_id": "sess",
            "device_id": "DEV"
        }
    }));
    let EventContent::RoomEncrypted(encrypted) = event.content() else {
        panic!("expected m.room.encrypted");
    };
    assert!(matches!(encrypted.scheme, EncryptedScheme::MegolmV1(_)));
}

#[test]
fn test_unknown_algorithm_is_unknown_variant() {
    let event = round_trip(json!({
        "type": "m.room.encrypted",
        "content": {"algorithm": "org.example.pq", "blob": "zzz"}
    }));
    let EventContent::RoomEncrypted(encrypted) = event.content() else {
        panic!("expected m.room.encrypted");
    };
    assert_eq!(encrypted.algorithm(), "org.example.pq");
    assert!(matches!(encrypted.scheme, EncryptedScheme::Unknown(_)));
}

#[test]
fn test_key_request_cancellation() {
    let event = round_trip(json!({
        "type": "m.room_key_request",
        "sender": "@alice:example.org",
        "content": {
            "action": "request_cancellation",
            "requesting_device_id": "DEV",
            "request_id": "1"
        }
    }));
    let EventContent::RoomKeyRequest(request) = event.content() else {
        panic!("expected m.room_key_request");
    };
    assert_eq!(request.action, KeyRequestAction::Cancellation);
}

#[test]
fn test_verification_start_unknown_method() {
    let event = round_trip(json!({
        "type": "m.key.verification.start",
        "content": {
            "from_device": "DEV",
            "transaction_id": "t1",
            "method": "org.example.v9",
            "secret_sauce": true
        }
    }));
    let EventContent::VerificationStart(start) = event.content() else {
        panic!("expected m.key.verification.start");
    };
    assert!(matches!(start.method, StartMethod::Unknown(_)));
}

#[test]
fn test_missing_msgtype_makes_content_opaque() {
    let event = round_trip(json!({
        "type": "m.room.message",
        "content": {"body": "no msgtype"}
    }));
    assert!(event.content().is_opaque());
}

// =========================================================================
// State discriminator
// =========================================================================

#[test]
fn test_state_key_variants() {
    let content = json!({"topic": "t"});
    let with_empty = decode_event(json!({"type": "m.room.topic", "state_key": "", "content": content})).unwrap();
    let with_null = decode_event(json!({"type": "m.room.topic", "state_key": null, "content": content})).unwrap();
    let without = decode_event(json!({"type": "m.room.topic", "content": content})).unwrap();

    assert_eq!(with_empty.state_key(), Some(""));
    assert!(!with_null.is_state());
    assert!(!without.is_state());
}

#[test]
fn test_state_event_with_prev_content() {
    let event = round_trip(json!({
        "type": "m.room.join_rules",
        "state_key": "",
        "content": {"join_rule": "invite"},
        "prev_content": {"join_rule": "public"}
    }));
    assert!(matches!(event.prev_content(), Some(EventContent::RoomJoinRules(_))));
}

// =========================================================================
// Errors
// =========================================================================

#[test]
fn test_slice_decode_errors() {
    assert!(decode_event_slice(b"nope").is_err());
    assert!(decode_event_slice(br#"{"content": {}}"#).unwrap_err().is_malformed_envelope());
}
