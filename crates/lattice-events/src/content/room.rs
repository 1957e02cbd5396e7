//! Room state content (`m.room.*` state events and `m.space.*`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::ImageInfo;

/// Room version assumed when `m.room.create` omits `room_version`.
pub const DEFAULT_ROOM_VERSION: &str = "1";

/// Default `rotation_period_ms` for `m.room.encryption` (one week).
pub const DEFAULT_ROTATION_PERIOD_MS: u64 = 604_800_000;

/// Default `rotation_period_msgs` for `m.room.encryption`.
pub const DEFAULT_ROTATION_PERIOD_MSGS: u64 = 100;

open_enum! {
    /// Who may join a room (`m.room.join_rules`).
    pub enum JoinRule {
        Public => "public",
        Invite => "invite",
        Knock => "knock",
        Private => "private",
        Restricted => "restricted",
        KnockRestricted => "knock_restricted",
    }
}

open_enum! {
    /// Who may read room history (`m.room.history_visibility`).
    pub enum HistoryVisibility {
        Invited => "invited",
        Joined => "joined",
        Shared => "shared",
        WorldReadable => "world_readable",
    }
}

open_enum! {
    /// Whether guests may join (`m.room.guest_access`).
    pub enum GuestAccess {
        CanJoin => "can_join",
        Forbidden => "forbidden",
    }
}

open_enum! {
    /// Membership state of a user in a room (`m.room.member`).
    pub enum Membership {
        Invite => "invite",
        Join => "join",
        Knock => "knock",
        Leave => "leave",
        Ban => "ban",
    }
}

// ---------------------------------------------------------------------------
// m.room.create
// ---------------------------------------------------------------------------

/// `m.room.create`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomCreateContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Removed from the event in room version 11.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(
        rename = "m.federate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub federate: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_version: Option<String>,

    /// The room this one replaces, if it is the result of an upgrade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<PreviousRoom>,

    /// Room type, e.g. `m.space`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

impl RoomCreateContent {
    /// Whether users on other servers may join. Defaults to `true`.
    pub fn federate(&self) -> bool {
        self.federate.unwrap_or(true)
    }

    /// The room version. Defaults to `"1"`.
    pub fn room_version(&self) -> &str {
        self.room_version.as_deref().unwrap_or(DEFAULT_ROOM_VERSION)
    }
}

/// Reference to the room a tombstoned room was upgraded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousRoom {
    pub room_id: String,
    /// Absent in newer room versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Simple descriptive state
// ---------------------------------------------------------------------------

/// `m.room.name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNameContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub name: String,
}

/// `m.room.topic`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTopicContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub topic: String,
}

/// `m.room.avatar`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomAvatarContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// `mxc://` URI; absent when the avatar was removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ImageInfo>,
}

/// `m.room.join_rules`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRulesContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub join_rule: JoinRule,
    /// Conditions for `restricted` and `knock_restricted` rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<AllowCondition>>,
}

/// One entry of a restricted room's `allow` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowCondition {
    /// `m.room_membership` for the only currently defined condition.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

/// `m.room.history_visibility`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryVisibilityContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub history_visibility: HistoryVisibility,
}

/// `m.room.guest_access`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestAccessContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub guest_access: GuestAccess,
}

// ---------------------------------------------------------------------------
// m.room.power_levels
// ---------------------------------------------------------------------------

/// `m.room.power_levels`
///
/// Every field is optional on the wire and has a protocol default. The raw
/// fields record what the server actually sent; use the accessor methods to
/// read the effective values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerLevelsContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_default: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kick: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redact: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_default: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_default: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationPowerLevels>,
}

impl PowerLevelsContent {
    pub fn ban(&self) -> i64 {
        self.ban.unwrap_or(50)
    }

    pub fn events_default(&self) -> i64 {
        self.events_default.unwrap_or(0)
    }

    pub fn invite(&self) -> i64 {
        self.invite.unwrap_or(0)
    }

    pub fn kick(&self) -> i64 {
        self.kick.unwrap_or(50)
    }

    pub fn redact(&self) -> i64 {
        self.redact.unwrap_or(50)
    }

    pub fn state_default(&self) -> i64 {
        self.state_default.unwrap_or(50)
    }

    pub fn users_default(&self) -> i64 {
        self.users_default.unwrap_or(0)
    }

    /// Level required to send `@room` notifications. Defaults to 50.
    pub fn room_notification(&self) -> i64 {
        self.notifications
            .as_ref()
            .and_then(|n| n.room)
            .unwrap_or(50)
    }

    /// Effective power level of `user_id`.
    pub fn user_level(&self, user_id: &str) -> i64 {
        self.users
            .as_ref()
            .and_then(|users| users.get(user_id).copied())
            .unwrap_or_else(|| self.users_default())
    }

    /// Level required to send an event of `event_type`.
    ///
    /// Falls back to `state_default` for state events and `events_default`
    /// otherwise.
    pub fn event_level(&self, event_type: &str, is_state: bool) -> i64 {
        self.events
            .as_ref()
            .and_then(|events| events.get(event_type).copied())
            .unwrap_or_else(|| {
                if is_state {
                    self.state_default()
                } else {
                    self.events_default()
                }
            })
    }
}

/// The `notifications` block of `m.room.power_levels`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationPowerLevels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<i64>,
}

// ---------------------------------------------------------------------------
// m.room.member
// ---------------------------------------------------------------------------

/// `m.room.member`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub membership: Membership,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_direct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_invite: Option<MemberThirdPartyInvite>,
    /// Server that authorised a restricted join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_authorised_via_users_server: Option<String>,
}

impl MemberContent {
    /// Builds a bare membership change.
    pub fn new(membership: Membership) -> Self {
        Self {
            extra: Map::new(),
            membership,
            displayname: None,
            avatar_url: None,
            is_direct: None,
            reason: None,
            third_party_invite: None,
            join_authorised_via_users_server: None,
        }
    }
}

/// Third-party invite proof embedded in a membership event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberThirdPartyInvite {
    pub display_name: String,
    /// Signed block from the identity server, kept as received.
    pub signed: Value,
}

// ---------------------------------------------------------------------------
// Aliases and encryption
// ---------------------------------------------------------------------------

/// `m.room.aliases`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasesContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub aliases: Vec<String>,
}

/// `m.room.canonical_alias`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalAliasContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_aliases: Option<Vec<String>>,
}

/// `m.room.encryption`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Always `m.megolm.v1.aes-sha2` today.
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_period_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_period_msgs: Option<u64>,
}

impl EncryptionContent {
    pub fn rotation_period_ms(&self) -> u64 {
        self.rotation_period_ms.unwrap_or(DEFAULT_ROTATION_PERIOD_MS)
    }

    pub fn rotation_period_msgs(&self) -> u64 {
        self.rotation_period_msgs
            .unwrap_or(DEFAULT_ROTATION_PERIOD_MSGS)
    }
}

/// `m.room.server_acl`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerAclContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_ip_literals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

impl ServerAclContent {
    /// Defaults to `true`.
    pub fn allow_ip_literals(&self) -> bool {
        self.allow_ip_literals.unwrap_or(true)
    }

    /// Server name globs allowed in the room. Empty when absent.
    pub fn allow(&self) -> &[String] {
        self.allow.as_deref().unwrap_or_default()
    }

    /// Server name globs denied in the room. Empty when absent.
    pub fn deny(&self) -> &[String] {
        self.deny.as_deref().unwrap_or_default()
    }
}

/// `m.room.third_party_invite`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyInviteContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub display_name: String,
    pub key_validity_url: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_keys: Option<Vec<PublicKey>>,
}

/// A key that can sign a third-party invite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_validity_url: Option<String>,
}

/// `m.room.tombstone`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TombstoneContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub body: String,
    pub replacement_room: String,
}

/// `m.room.pinned_events`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedEventsContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub pinned: Vec<String>,
}

/// `m.room.redaction`
///
/// `redacts` moved from the envelope into content in room version 11, so
/// both locations occur in the wild; the envelope copy stays in the event's
/// extra fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedactionContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// `m.space.child`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpaceChildContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Servers to try when joining the child. Absent means the link is
    /// removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested: Option<bool>,
}

impl SpaceChildContent {
    pub fn suggested(&self) -> bool {
        self.suggested.unwrap_or(false)
    }
}

/// `m.space.parent`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpaceParentContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<bool>,
}

impl SpaceParentContent {
    pub fn canonical(&self) -> bool {
        self.canonical.unwrap_or(false)
    }
}

extra_fields!(
    RoomCreateContent,
    RoomNameContent,
    RoomTopicContent,
    RoomAvatarContent,
    JoinRulesContent,
    HistoryVisibilityContent,
    GuestAccessContent,
    PowerLevelsContent,
    MemberContent,
    AliasesContent,
    CanonicalAliasContent,
    EncryptionContent,
    ServerAclContent,
    ThirdPartyInviteContent,
    TombstoneContent,
    PinnedEventsContent,
    RedactionContent,
    SpaceChildContent,
    SpaceParentContent,
);
