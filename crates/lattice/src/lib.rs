//! # Lattice
//!
//! Typed wire-protocol codec for the Matrix client-server API.
//!
//! Lattice decodes the JSON a homeserver sends into strongly-typed values
//! and never fails on well-formed input it does not recognize:
//!
//! - events: envelope, content registry, state/timeline classification
//!   (`lattice-events`)
//! - error responses: errcode taxonomy and the interactive-auth carve-out
//!   (`lattice-errors`)
//! - batches: state dumps, timeline chunks, and sync payloads
//!   (`lattice-sync`)
//!
//! HTTP itself is left to the caller. Hand each response's status and body
//! to [`decode_response`] (or one of its typed variants) and get back either
//! JSON to decode further or a typed error.
//!
//! ## Quick Start
//!
//! ```rust
//! use lattice::prelude::*;
//!
//! let body = br#"{"errcode":"M_LIMIT_EXCEEDED","error":"Too many requests","retry_after_ms":2000}"#;
//! let err = lattice::decode_response(429, body).unwrap_err();
//!
//! let matrix = err.as_matrix().unwrap();
//! assert_eq!(matrix.errcode(), "M_LIMIT_EXCEEDED");
//! assert_eq!(matrix.retry_after(), Some(std::time::Duration::from_secs(2)));
//! ```

mod error;

pub use error::LatticeError;
pub use lattice_errors as errors;
pub use lattice_events as events;
pub use lattice_sync as sync;

use lattice_events::Event;
use lattice_sync::{BatchConfig, SyncResponse};
use serde_json::Value;

/// Everything most callers need.
pub mod prelude {
    pub use crate::LatticeError;
    pub use lattice_errors::{ClassifyError, ErrorKind, MatrixError, UiaChallenge};
    pub use lattice_events::{
        Codec, Event, EventContent, EventEnvelope, EventError, EventMeta, OpaqueContent,
        StateEvent, TimelineEvent, UnknownVariant,
    };
    #[cfg(feature = "json")]
    pub use lattice_events::JsonCodec;
    pub use lattice_sync::{BatchConfig, MalformedPolicy, SyncError, SyncResponse};
}

/// Splits a raw HTTP response into success JSON or a typed error.
///
/// A 2xx status yields the parsed body. Anything else goes through the
/// error classifier.
///
/// # Errors
/// - [`LatticeError::Matrix`] for a classified error response.
/// - [`LatticeError::Classify`] for an unclassifiable body or an
///   interactive-auth challenge.
/// - [`LatticeError::InvalidBody`] for a 2xx body that is not JSON.
pub fn decode_response(status: u16, body: &[u8]) -> Result<Value, LatticeError> {
    if !(200..300).contains(&status) {
        let err = lattice_errors::classify(status, body)?;
        tracing::debug!(status, errcode = err.errcode(), "classified error response");
        return Err(err.into());
    }
    serde_json::from_slice(body).map_err(LatticeError::InvalidBody)
}

/// [`decode_response`], then decodes the body as one event.
///
/// # Errors
/// As [`decode_response`], plus [`LatticeError::Event`].
pub fn decode_event_response(status: u16, body: &[u8]) -> Result<Event, LatticeError> {
    let value = decode_response(status, body)?;
    Ok(lattice_events::decode_event(value)?)
}

/// [`decode_response`], then decodes the body as a sync response.
///
/// # Errors
/// As [`decode_response`], plus [`LatticeError::Sync`].
pub fn decode_sync_response(
    status: u16,
    body: &[u8],
    config: &BatchConfig,
) -> Result<SyncResponse, LatticeError> {
    let value = decode_response(status, body)?;
    Ok(SyncResponse::from_json(value, config)?)
}
