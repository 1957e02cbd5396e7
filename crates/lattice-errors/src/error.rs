//! Error types for the error classifier.

use crate::UiaChallenge;

/// Reasons a response body could not be classified as a [`MatrixError`].
///
/// [`MatrixError`]: crate::MatrixError
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The body is not a protocol error body: not JSON, not an object, or
    /// missing a string `errcode` or `error`. Typically a proxy or load
    /// balancer answered instead of the homeserver.
    #[error("undecodable error body (status {status}): {reason}")]
    TransportDecode { status: u16, reason: String },

    /// The body is an interactive-authentication challenge.
    #[error("interactive authentication required")]
    InteractiveAuth(Box<UiaChallenge>),
}

impl ClassifyError {
    pub(crate) fn transport(status: u16, reason: impl Into<String>) -> Self {
        Self::TransportDecode {
            status,
            reason: reason.into(),
        }
    }

    /// The challenge, if the body asked for interactive auth.
    pub fn as_challenge(&self) -> Option<&UiaChallenge> {
        match self {
            Self::InteractiveAuth(challenge) => Some(challenge),
            Self::TransportDecode { .. } => None,
        }
    }
}
