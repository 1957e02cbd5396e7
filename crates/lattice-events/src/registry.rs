//! The content registry: event `type` string to content schema.
//!
//! [`resolve`] is total. A registered type whose content matches its schema
//! becomes the corresponding [`EventContent`] variant; anything else
//! (an unregistered type, or a registered one whose payload does not fit)
//! becomes [`EventContent::Opaque`] with the JSON left untouched.
//!
//! The table is built once on first use and is read-only afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::content::account::{
    AcceptedTermsContent, DirectContent, FullyReadContent, IdentityServerContent,
    IgnoredUserListContent, PushRulesContent, TagContent,
};
use crate::content::call::{
    CallAnswerContent, CallCandidatesContent, CallHangupContent, CallInviteContent,
    CallNegotiateContent, CallRejectContent, CallSelectAnswerContent,
};
use crate::content::encryption::{
    DummyContent, EncryptedContent, ForwardedRoomKeyContent, RoomKeyContent,
    RoomKeyRequestContent, RoomKeyWithheldContent, SecretRequestContent, SecretSendContent,
};
use crate::content::ephemeral::{PresenceContent, ReceiptContent, TypingContent};
use crate::content::message::{ReactionContent, RoomMessageContent, StickerContent};
use crate::content::policy::PolicyRuleContent;
use crate::content::room::{
    AliasesContent, CanonicalAliasContent, EncryptionContent, GuestAccessContent,
    HistoryVisibilityContent, JoinRulesContent, MemberContent, PinnedEventsContent,
    PowerLevelsContent, RedactionContent, RoomAvatarContent, RoomCreateContent,
    RoomNameContent, RoomTopicContent, ServerAclContent, SpaceChildContent,
    SpaceParentContent, ThirdPartyInviteContent, TombstoneContent,
};
use crate::content::verification::{
    VerificationAcceptContent, VerificationCancelContent, VerificationDoneContent,
    VerificationKeyContent, VerificationMacContent, VerificationReadyContent,
    VerificationRequestContent, VerificationStartContent,
};
use crate::content::{self, ExtraFields, OpaqueContent};
use crate::EventError;

type ContentDecoder = fn(&Value) -> Result<EventContent, serde_json::Error>;

/// Decodes a registered schema and moves keys that would not survive
/// re-encoding (explicit nulls, for one) into its extra map.
fn decode_known<T>(raw: &Value) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Serialize + ExtraFields,
{
    let mut typed = T::deserialize(raw)?;
    let Value::Object(object) = raw else {
        return Ok(typed);
    };
    if typed.extra_mut().is_none() {
        return Ok(typed);
    }
    let lost = content::residue(object, &serde_json::to_value(&typed)?);
    if let Some(extra) = typed.extra_mut() {
        extra.extend(lost);
    }
    Ok(typed)
}

/// Declares [`EventContent`] and the registry table from one list, so the
/// enum, `event_type()`, and the decode table cannot drift apart.
macro_rules! content_registry {
    (
        $( $(#[$meta:meta])* $variant:ident($ty:ty) => $tag:literal, )*
    ) => {
        /// Decoded content of an event, keyed by the event's `type`.
        #[derive(Debug, Clone, PartialEq)]
        pub enum EventContent {
            $( $(#[$meta])* $variant($ty), )*
            /// Unregistered type, or content that does not match its schema.
            Opaque(OpaqueContent),
        }

        impl EventContent {
            /// The `type` string this content belongs under.
            pub fn event_type(&self) -> &str {
                match self {
                    $( Self::$variant(_) => $tag, )*
                    Self::Opaque(opaque) => &opaque.event_type,
                }
            }

            /// Encodes the content back to its wire JSON.
            ///
            /// # Errors
            /// Returns [`EventError::Encode`] if a typed value cannot be
            /// represented as JSON.
            pub fn to_json(&self) -> Result<Value, EventError> {
                match self {
                    $( Self::$variant(content) => {
                        serde_json::to_value(content).map_err(EventError::Encode)
                    } )*
                    Self::Opaque(opaque) => Ok(opaque.content.clone()),
                }
            }
        }

        static REGISTRY: LazyLock<HashMap<&'static str, ContentDecoder>> =
            LazyLock::new(|| {
                HashMap::from([
                    $( (
                        $tag,
                        (|raw: &Value| decode_known::<$ty>(raw).map(EventContent::$variant))
                            as ContentDecoder,
                    ), )*
                ])
            });
    };
}

content_registry! {
    // Call signaling
    CallInvite(CallInviteContent) => "m.call.invite",
    CallCandidates(CallCandidatesContent) => "m.call.candidates",
    CallAnswer(CallAnswerContent) => "m.call.answer",
    CallHangup(CallHangupContent) => "m.call.hangup",
    CallReject(CallRejectContent) => "m.call.reject",
    CallSelectAnswer(CallSelectAnswerContent) => "m.call.select_answer",
    CallNegotiate(CallNegotiateContent) => "m.call.negotiate",

    // Room state
    RoomCreate(RoomCreateContent) => "m.room.create",
    RoomName(RoomNameContent) => "m.room.name",
    RoomTopic(RoomTopicContent) => "m.room.topic",
    RoomAvatar(RoomAvatarContent) => "m.room.avatar",
    RoomJoinRules(JoinRulesContent) => "m.room.join_rules",
    RoomHistoryVisibility(HistoryVisibilityContent) => "m.room.history_visibility",
    RoomGuestAccess(GuestAccessContent) => "m.room.guest_access",
    RoomPowerLevels(PowerLevelsContent) => "m.room.power_levels",
    RoomMember(MemberContent) => "m.room.member",
    RoomAliases(AliasesContent) => "m.room.aliases",
    RoomCanonicalAlias(CanonicalAliasContent) => "m.room.canonical_alias",
    RoomEncryption(EncryptionContent) => "m.room.encryption",
    RoomServerAcl(ServerAclContent) => "m.room.server_acl",
    RoomThirdPartyInvite(ThirdPartyInviteContent) => "m.room.third_party_invite",
    RoomTombstone(TombstoneContent) => "m.room.tombstone",
    RoomPinnedEvents(PinnedEventsContent) => "m.room.pinned_events",
    RoomRedaction(RedactionContent) => "m.room.redaction",
    SpaceChild(SpaceChildContent) => "m.space.child",
    SpaceParent(SpaceParentContent) => "m.space.parent",

    // Messages
    RoomMessage(RoomMessageContent) => "m.room.message",
    Sticker(StickerContent) => "m.sticker",
    Reaction(ReactionContent) => "m.reaction",

    // End-to-end encryption
    RoomKey(RoomKeyContent) => "m.room_key",
    ForwardedRoomKey(ForwardedRoomKeyContent) => "m.forwarded_room_key",
    RoomKeyRequest(RoomKeyRequestContent) => "m.room_key_request",
    RoomKeyWithheld(RoomKeyWithheldContent) => "m.room_key.withheld",
    RoomEncrypted(EncryptedContent) => "m.room.encrypted",
    Dummy(DummyContent) => "m.dummy",
    SecretRequest(SecretRequestContent) => "m.secret.request",
    SecretSend(SecretSendContent) => "m.secret.send",

    // Key verification
    VerificationRequest(VerificationRequestContent) => "m.key.verification.request",
    VerificationReady(VerificationReadyContent) => "m.key.verification.ready",
    VerificationStart(VerificationStartContent) => "m.key.verification.start",
    VerificationAccept(VerificationAcceptContent) => "m.key.verification.accept",
    VerificationKey(VerificationKeyContent) => "m.key.verification.key",
    VerificationMac(VerificationMacContent) => "m.key.verification.mac",
    VerificationCancel(VerificationCancelContent) => "m.key.verification.cancel",
    VerificationDone(VerificationDoneContent) => "m.key.verification.done",

    // Moderation policy
    PolicyRuleUser(PolicyRuleContent) => "m.policy.rule.user",
    PolicyRuleRoom(PolicyRuleContent) => "m.policy.rule.room",
    PolicyRuleServer(PolicyRuleContent) => "m.policy.rule.server",

    // Ephemeral
    Presence(PresenceContent) => "m.presence",
    Receipt(ReceiptContent) => "m.receipt",
    Typing(TypingContent) => "m.typing",

    // Account data
    Tag(TagContent) => "m.tag",
    PushRules(PushRulesContent) => "m.push_rules",
    Direct(DirectContent) => "m.direct",
    IgnoredUserList(IgnoredUserListContent) => "m.ignored_user_list",
    AcceptedTerms(AcceptedTermsContent) => "m.accepted_terms",
    FullyRead(FullyReadContent) => "m.fully_read",
    IdentityServer(IdentityServerContent) => "m.identity_server",
}

impl EventContent {
    /// Returns `true` for the opaque fallback.
    pub fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque(_))
    }

    /// Returns the opaque fallback, if this is one.
    pub fn as_opaque(&self) -> Option<&OpaqueContent> {
        match self {
            Self::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }
}

/// Returns `true` if `event_type` has a registered schema.
pub fn is_registered(event_type: &str) -> bool {
    REGISTRY.contains_key(event_type)
}

/// Number of registered event types.
pub fn registered_count() -> usize {
    REGISTRY.len()
}

/// Resolves raw content against the registry. Never fails.
pub fn resolve(event_type: &str, raw: Value) -> EventContent {
    match try_resolve(event_type, &raw) {
        Some(content) => content,
        None => EventContent::Opaque(OpaqueContent::new(event_type, raw)),
    }
}

/// Decodes `raw` into its registered schema, or `None` if the type is
/// unregistered or the payload does not fit.
///
/// Leaves the raw value with the caller, who decides how to build the
/// fallback.
pub(crate) fn try_resolve(event_type: &str, raw: &Value) -> Option<EventContent> {
    let decode = REGISTRY.get(event_type)?;
    match decode(raw) {
        Ok(content) => Some(content),
        Err(error) => {
            tracing::debug!(
                event_type,
                %error,
                "content does not match registered schema, keeping it opaque"
            );
            None
        }
    }
}
