//! Error types for the batch layer.

use lattice_events::EventError;

/// Errors that can occur while decoding an event batch or sync payload.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The container itself has the wrong shape: not an object, not an
    /// array where one is required, or missing `next_batch`.
    #[error("invalid sync payload: {0}")]
    InvalidPayload(String),

    /// An entry could not be decoded and the policy is
    /// [`MalformedPolicy::Fail`](crate::MalformedPolicy::Fail).
    #[error("malformed event at index {index} in {section}: {source}")]
    MalformedEvent {
        /// Where the array came from, e.g. `rooms.join.!abc:example.org.timeline`.
        section: String,
        index: usize,
        source: EventError,
    },
}

impl SyncError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPayload(reason.into())
    }
}
