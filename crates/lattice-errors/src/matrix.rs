//! The typed form of a homeserver error response.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::ErrorKind;

/// Wire key of the machine-readable error code.
pub const ERRCODE: &str = "errcode";

/// Wire key of the human-readable message.
pub const ERROR: &str = "error";

/// An error response from the homeserver.
///
/// Produced by [`classify`](crate::classify) from a status and a body with
/// `errcode` and `error`. Re-encodes to the same body with [`to_json`].
///
/// [`to_json`]: MatrixError::to_json
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status} {errcode}: {message}", errcode = .kind.errcode())]
pub struct MatrixError {
    /// HTTP status of the response.
    pub status: u16,
    pub kind: ErrorKind,
    /// The `error` field.
    pub message: String,
    /// Body fields not covered by `errcode`, `error`, or the kind.
    pub extra: Map<String, Value>,
}

impl MatrixError {
    pub fn new(status: u16, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// The wire errcode.
    pub fn errcode(&self) -> &str {
        self.kind.errcode()
    }

    /// The server's retry hint for rate-limited requests.
    ///
    /// `None` for any other error, and for a rate limit without a hint.
    pub fn retry_after(&self) -> Option<Duration> {
        match self.kind {
            ErrorKind::LimitExceeded {
                retry_after_ms: Some(ms),
            } => Some(Duration::from_millis(ms)),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, ErrorKind::LimitExceeded { .. })
    }

    /// Re-encodes the error body.
    pub fn to_json(&self) -> Value {
        let mut body = self.extra.clone();
        self.kind.write_fields(&mut body);
        body.insert(ERRCODE.to_owned(), Value::String(self.errcode().to_owned()));
        body.insert(ERROR.to_owned(), Value::String(self.message.clone()));
        Value::Object(body)
    }
}
