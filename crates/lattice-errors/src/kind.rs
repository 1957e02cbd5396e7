//! The errcode taxonomy.
//!
//! Every errcode the protocol defines gets its own [`ErrorKind`] variant.
//! A handful carry errcode-specific fields pulled from the body
//! (`retry_after_ms`, `soft_logout`, ...). Anything unrecognized becomes
//! [`ErrorKind::Unknown`] with the raw errcode kept.

use serde_json::{Map, Value};

pub const LIMIT_EXCEEDED: &str = "M_LIMIT_EXCEEDED";
pub const UNKNOWN_TOKEN: &str = "M_UNKNOWN_TOKEN";
pub const INCOMPATIBLE_ROOM_VERSION: &str = "M_INCOMPATIBLE_ROOM_VERSION";
pub const RESOURCE_LIMIT_EXCEEDED: &str = "M_RESOURCE_LIMIT_EXCEEDED";

macro_rules! error_kinds {
    (
        $( $(#[$meta:meta])* $variant:ident => $errcode:literal, )*
    ) => {
        /// What went wrong, as identified by the body's `errcode`.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum ErrorKind {
            $( $(#[$meta])* $variant, )*

            /// `M_LIMIT_EXCEEDED`: too many requests.
            LimitExceeded {
                /// How long to wait before retrying. `None` means the server
                /// did not say, not that no wait is needed.
                retry_after_ms: Option<u64>,
            },
            /// `M_UNKNOWN_TOKEN`: the access token is not recognized.
            UnknownToken {
                /// `Some(true)` if the client may re-authenticate without
                /// discarding its device.
                soft_logout: Option<bool>,
            },
            /// `M_INCOMPATIBLE_ROOM_VERSION`: this server cannot join the room.
            IncompatibleRoomVersion {
                /// Version of the room the server was asked to join.
                room_version: Option<String>,
            },
            /// `M_RESOURCE_LIMIT_EXCEEDED`: a server-wide resource limit.
            ResourceLimitExceeded {
                /// URI to contact the server administrator at.
                admin_contact: Option<String>,
            },

            /// An errcode this version does not know.
            Unknown {
                /// The errcode exactly as received.
                errcode: String,
            },
        }

        impl ErrorKind {
            /// The wire errcode for this kind.
            pub fn errcode(&self) -> &str {
                match self {
                    $( Self::$variant => $errcode, )*
                    Self::LimitExceeded { .. } => LIMIT_EXCEEDED,
                    Self::UnknownToken { .. } => UNKNOWN_TOKEN,
                    Self::IncompatibleRoomVersion { .. } => INCOMPATIBLE_ROOM_VERSION,
                    Self::ResourceLimitExceeded { .. } => RESOURCE_LIMIT_EXCEEDED,
                    Self::Unknown { errcode } => errcode,
                }
            }

            /// Builds the kind for `errcode`, moving any errcode-specific
            /// fields out of `body`. Fields with an unexpected JSON type are
            /// left in `body`.
            pub(crate) fn from_errcode(errcode: &str, body: &mut Map<String, Value>) -> Self {
                match errcode {
                    $( $errcode => Self::$variant, )*
                    LIMIT_EXCEEDED => Self::LimitExceeded {
                        retry_after_ms: take(body, "retry_after_ms", as_millis),
                    },
                    UNKNOWN_TOKEN => Self::UnknownToken {
                        soft_logout: take(body, "soft_logout", Value::as_bool),
                    },
                    INCOMPATIBLE_ROOM_VERSION => Self::IncompatibleRoomVersion {
                        room_version: take(body, "room_version", |v| {
                            v.as_str().map(str::to_owned)
                        }),
                    },
                    RESOURCE_LIMIT_EXCEEDED => Self::ResourceLimitExceeded {
                        admin_contact: take(body, "admin_contact", |v| {
                            v.as_str().map(str::to_owned)
                        }),
                    },
                    other => Self::Unknown {
                        errcode: other.to_owned(),
                    },
                }
            }

            /// Returns `true` if `errcode` maps to a dedicated variant.
            pub fn is_known_errcode(errcode: &str) -> bool {
                matches!(
                    errcode,
                    $( $errcode | )* LIMIT_EXCEEDED
                        | UNKNOWN_TOKEN
                        | INCOMPATIBLE_ROOM_VERSION
                        | RESOURCE_LIMIT_EXCEEDED
                )
            }
        }
    };
}

error_kinds! {
    /// `M_FORBIDDEN`: the request is not permitted.
    Forbidden => "M_FORBIDDEN",
    /// `M_MISSING_TOKEN`: no access token was supplied.
    MissingToken => "M_MISSING_TOKEN",
    /// `M_BAD_JSON`: the body was JSON but not what the endpoint expects.
    BadJson => "M_BAD_JSON",
    /// `M_NOT_JSON`: the body was not JSON.
    NotJson => "M_NOT_JSON",
    /// `M_NOT_FOUND`: no resource was found for the request.
    NotFound => "M_NOT_FOUND",
    /// `M_UNRECOGNIZED`: the endpoint is not implemented.
    Unrecognized => "M_UNRECOGNIZED",
    /// `M_UNKNOWN`: the server's generic error code.
    Generic => "M_UNKNOWN",
    /// `M_UNAUTHORIZED`: the request was not correctly authorized, usually a bad login.
    Unauthorized => "M_UNAUTHORIZED",
    /// `M_USER_DEACTIVATED`: the user ID belongs to a deactivated account.
    UserDeactivated => "M_USER_DEACTIVATED",
    /// `M_USER_IN_USE`: the desired user ID is already taken.
    UserInUse => "M_USER_IN_USE",
    /// `M_INVALID_USERNAME`: the desired user ID is not a valid user name.
    InvalidUsername => "M_INVALID_USERNAME",
    /// `M_ROOM_IN_USE`: the requested room alias is already taken.
    RoomInUse => "M_ROOM_IN_USE",
    /// `M_INVALID_ROOM_STATE`: the initial state given to room creation is invalid.
    InvalidRoomState => "M_INVALID_ROOM_STATE",
    /// `M_THREEPID_IN_USE`: the third-party identifier is already bound to a user.
    ThreepidInUse => "M_THREEPID_IN_USE",
    /// `M_THREEPID_NOT_FOUND`: no user is bound to the third-party identifier.
    ThreepidNotFound => "M_THREEPID_NOT_FOUND",
    /// `M_THREEPID_AUTH_FAILED`: the third-party identifier could not be validated.
    ThreepidAuthFailed => "M_THREEPID_AUTH_FAILED",
    /// `M_THREEPID_DENIED`: the server does not permit this third-party identifier.
    ThreepidDenied => "M_THREEPID_DENIED",
    /// `M_THREEPID_MEDIUM_NOT_SUPPORTED`: the homeserver does not support the identifier's medium.
    ThreepidMediumNotSupported => "M_THREEPID_MEDIUM_NOT_SUPPORTED",
    /// `M_SERVER_NOT_TRUSTED`: the identity server named in the request is not trusted.
    ServerNotTrusted => "M_SERVER_NOT_TRUSTED",
    /// `M_UNSUPPORTED_ROOM_VERSION`: the server does not support the requested room version.
    UnsupportedRoomVersion => "M_UNSUPPORTED_ROOM_VERSION",
    /// `M_BAD_STATE`: the request cannot be performed on the room's current state.
    BadState => "M_BAD_STATE",
    /// `M_GUEST_ACCESS_FORBIDDEN`: the room or resource does not allow guests.
    GuestAccessForbidden => "M_GUEST_ACCESS_FORBIDDEN",
    /// `M_CAPTCHA_NEEDED`: a captcha is required to proceed.
    CaptchaNeeded => "M_CAPTCHA_NEEDED",
    /// `M_CAPTCHA_INVALID`: the captcha response was wrong.
    CaptchaInvalid => "M_CAPTCHA_INVALID",
    /// `M_MISSING_PARAM`: a required parameter was missing.
    MissingParam => "M_MISSING_PARAM",
    /// `M_INVALID_PARAM`: a parameter had the wrong value.
    InvalidParam => "M_INVALID_PARAM",
    /// `M_TOO_LARGE`: the request or entity was too large.
    TooLarge => "M_TOO_LARGE",
    /// `M_EXCLUSIVE`: the resource is reserved by an application service.
    Exclusive => "M_EXCLUSIVE",
    /// `M_CANNOT_LEAVE_SERVER_NOTICE_ROOM`: users may not leave the server notices room.
    CannotLeaveServerNoticeRoom => "M_CANNOT_LEAVE_SERVER_NOTICE_ROOM",
    /// `M_WEAK_PASSWORD`: the password is too weak for the server's policy.
    WeakPassword => "M_WEAK_PASSWORD",
    /// `M_INVALID_SIGNATURE`: a signature on the request could not be verified.
    InvalidSignature => "M_INVALID_SIGNATURE",
    /// `M_BAD_ALIAS`: an alias in the request does not point where it claims to.
    BadAlias => "M_BAD_ALIAS",
    /// `M_DUPLICATE_ANNOTATION`: the user already sent this annotation.
    DuplicateAnnotation => "M_DUPLICATE_ANNOTATION",
    /// `M_NOT_YET_UPLOADED`: the media ID exists but its content has not arrived yet.
    NotYetUploaded => "M_NOT_YET_UPLOADED",
    /// `M_CANNOT_OVERWRITE_MEDIA`: the media ID already has content.
    CannotOverwriteMedia => "M_CANNOT_OVERWRITE_MEDIA",
    /// `M_UNKNOWN_POS`: a sliding-window position expired.
    UnknownPos => "M_UNKNOWN_POS",
    /// `M_URL_NOT_SET`: no URL was configured for the requested resource.
    UrlNotSet => "M_URL_NOT_SET",
    /// `M_WRONG_ROOM_KEYS_VERSION`: `current_version` stays in the extra fields.
    WrongRoomKeysVersion => "M_WRONG_ROOM_KEYS_VERSION",
    /// `M_CONSENT_NOT_GIVEN`: `consent_uri` stays in the extra fields.
    ConsentNotGiven => "M_CONSENT_NOT_GIVEN",
    /// `M_USER_LOCKED`: the account is locked and must log in again to unlock it.
    UserLocked => "M_USER_LOCKED",
    /// `M_USER_SUSPENDED`: the account is suspended and may only read.
    UserSuspended => "M_USER_SUSPENDED",
    /// `M_UNACTIONABLE`: the server will not act on the request, e.g. a report on itself.
    Unactionable => "M_UNACTIONABLE",
}

impl ErrorKind {
    /// Writes the errcode-specific fields back into a wire body.
    pub(crate) fn write_fields(&self, body: &mut Map<String, Value>) {
        match self {
            Self::LimitExceeded {
                retry_after_ms: Some(ms),
            } => {
                body.insert("retry_after_ms".to_owned(), Value::from(*ms));
            }
            Self::UnknownToken {
                soft_logout: Some(soft_logout),
            } => {
                body.insert("soft_logout".to_owned(), Value::Bool(*soft_logout));
            }
            Self::IncompatibleRoomVersion {
                room_version: Some(version),
            } => {
                body.insert("room_version".to_owned(), Value::String(version.clone()));
            }
            Self::ResourceLimitExceeded {
                admin_contact: Some(contact),
            } => {
                body.insert("admin_contact".to_owned(), Value::String(contact.clone()));
            }
            _ => {}
        }
    }
}

/// Reads a millisecond count. Some servers write it as a float, so an
/// integral float like `2000.0` is accepted too.
fn as_millis(value: &Value) -> Option<u64> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }
    let ms = value.as_f64()?;
    (ms.is_finite() && ms >= 0.0 && ms.fract() == 0.0 && ms < u64::MAX as f64)
        .then_some(ms as u64)
}

fn take<T>(
    body: &mut Map<String, Value>,
    key: &str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = body.get(key).and_then(convert)?;
    body.remove(key);
    Some(value)
}
