//! Room messages (`m.room.message`), stickers, and reactions.
//!
//! `m.room.message` is a nested family: every message shares `body` (and an
//! optional relation), and `msgtype` selects the rest of the shape.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::nested::{self, Variant, VariantTable};
use super::relation::RelatesTo;
use super::UnknownVariant;

/// Discriminator key of the message family.
pub const MSGTYPE_KEY: &str = "msgtype";

// ---------------------------------------------------------------------------
// Media metadata
// ---------------------------------------------------------------------------

/// Metadata about an image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// Metadata about a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThumbnailInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Metadata about a generic file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// Metadata about an audio clip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioInfo {
    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Metadata about a video clip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// Metadata attached to a location message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_info: Option<ThumbnailInfo>,
}

/// An attachment uploaded encrypted (`file` instead of `url`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    pub url: String,
    pub key: JsonWebKey,
    pub iv: String,
    /// Hash algorithm name to unpadded base64 digest.
    pub hashes: BTreeMap<String, String>,
    /// Encryption scheme version, `v2` today.
    pub v: String,
}

/// The AES key of an [`EncryptedFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    pub key_ops: Vec<String>,
    pub alg: String,
    pub k: String,
    pub ext: bool,
}

// ---------------------------------------------------------------------------
// Message variants
// ---------------------------------------------------------------------------

/// Body of `m.text`, `m.emote` and `m.notice` messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextualMessage {
    /// Format of `formatted_body`, `org.matrix.custom.html` today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_body: Option<String>,
}

/// Body of an `m.image` message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageMessage {
    /// Set for unencrypted uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Set for encrypted uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ImageInfo>,
}

/// Body of an `m.file` message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMessage {
    /// Original file name when `body` is a caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<FileInfo>,
}

/// Body of an `m.audio` message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AudioMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<AudioInfo>,
}

/// Body of an `m.video` message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<EncryptedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<VideoInfo>,
}

/// Body of an `m.location` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMessage {
    /// A `geo:` URI.
    pub geo_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<LocationInfo>,
}

/// Body of an `m.server_notice` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNoticeMessage {
    /// `m.server_notice.usage_limit_reached` is the only defined type.
    pub server_notice_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_type: Option<String>,
}

/// The `msgtype`-specific part of a room message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Text(TextualMessage),
    Emote(TextualMessage),
    Notice(TextualMessage),
    Image(ImageMessage),
    File(FileMessage),
    Audio(AudioMessage),
    Video(VideoMessage),
    Location(LocationMessage),
    ServerNotice(ServerNoticeMessage),
    /// A `msgtype` without a typed variant.
    Unknown(UnknownVariant),
}

impl Variant for MessageKind {
    fn tag(&self) -> &str {
        match self {
            Self::Text(_) => "m.text",
            Self::Emote(_) => "m.emote",
            Self::Notice(_) => "m.notice",
            Self::Image(_) => "m.image",
            Self::File(_) => "m.file",
            Self::Audio(_) => "m.audio",
            Self::Video(_) => "m.video",
            Self::Location(_) => "m.location",
            Self::ServerNotice(_) => "m.server_notice",
            Self::Unknown(unknown) => &unknown.tag,
        }
    }

    fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Text(body) | Self::Emote(body) | Self::Notice(body) => {
                serde_json::to_value(body)
            }
            Self::Image(body) => serde_json::to_value(body),
            Self::File(body) => serde_json::to_value(body),
            Self::Audio(body) => serde_json::to_value(body),
            Self::Video(body) => serde_json::to_value(body),
            Self::Location(body) => serde_json::to_value(body),
            Self::ServerNotice(body) => serde_json::to_value(body),
            Self::Unknown(unknown) => Ok(Value::Object(unknown.fields.clone())),
        }
    }
}

static MESSAGE_KINDS: LazyLock<VariantTable<MessageKind>> = LazyLock::new(|| {
    VariantTable::new(
        MSGTYPE_KEY,
        MessageKind::Unknown,
        &[
            ("m.text", |v| TextualMessage::deserialize(v).map(MessageKind::Text)),
            ("m.emote", |v| TextualMessage::deserialize(v).map(MessageKind::Emote)),
            ("m.notice", |v| TextualMessage::deserialize(v).map(MessageKind::Notice)),
            ("m.image", |v| ImageMessage::deserialize(v).map(MessageKind::Image)),
            ("m.file", |v| FileMessage::deserialize(v).map(MessageKind::File)),
            ("m.audio", |v| AudioMessage::deserialize(v).map(MessageKind::Audio)),
            ("m.video", |v| VideoMessage::deserialize(v).map(MessageKind::Video)),
            ("m.location", |v| {
                LocationMessage::deserialize(v).map(MessageKind::Location)
            }),
            ("m.server_notice", |v| {
                ServerNoticeMessage::deserialize(v).map(MessageKind::ServerNotice)
            }),
        ],
    )
});

// ---------------------------------------------------------------------------
// m.room.message
// ---------------------------------------------------------------------------

/// `m.room.message`
#[derive(Debug, Clone, PartialEq)]
pub struct RoomMessageContent {
    /// Plain-text rendering of the message, present for every `msgtype`.
    pub body: String,
    pub relates_to: Option<RelatesTo>,
    pub kind: MessageKind,
    /// Keys outside the typed schema, written back unchanged.
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct MessageShared {
    body: String,
    #[serde(
        rename = "m.relates_to",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    relates_to: Option<RelatesTo>,
}

impl RoomMessageContent {
    /// A plain `m.text` message.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            relates_to: None,
            kind: MessageKind::Text(TextualMessage::default()),
            extra: Map::new(),
        }
    }

    /// The raw `msgtype` value.
    pub fn msgtype(&self) -> &str {
        self.kind.tag()
    }

    /// Returns `true` if `msgtype` has a typed variant in this version.
    pub fn is_known_msgtype(msgtype: &str) -> bool {
        MESSAGE_KINDS.is_known(msgtype)
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        let shared = MessageShared {
            body: self.body.clone(),
            relates_to: self.relates_to.clone(),
        };
        nested::encode(&shared, MESSAGE_KINDS.key(), &self.kind, &self.extra)
    }
}

impl Serialize for RoomMessageContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        nested::serialize_value(self.to_value(), serializer)
    }
}

impl<'de> Deserialize<'de> for RoomMessageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let nested::Decoded { shared, kind, extra } =
            nested::decode::<MessageShared, _>(value, &MESSAGE_KINDS)
                .map_err(serde::de::Error::custom)?;
        Ok(Self {
            body: shared.body,
            relates_to: shared.relates_to,
            kind,
            extra,
        })
    }
}

// ---------------------------------------------------------------------------
// Stickers and reactions
// ---------------------------------------------------------------------------

/// `m.sticker`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Description of the sticker.
    pub body: String,
    pub info: ImageInfo,
    pub url: String,
}

/// `m.reaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionContent {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(rename = "m.relates_to")]
    pub relates_to: RelatesTo,
}

extra_fields!(
    RoomMessageContent,
    StickerContent,
    ReactionContent,
);
