//! Unified error type for Lattice.

use lattice_errors::{ClassifyError, MatrixError};
use lattice_events::EventError;
use lattice_sync::SyncError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lattice` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant generates the `From` impls `?` needs.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    /// The homeserver answered with a protocol error.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// An error response that could not be classified, or an
    /// interactive-auth challenge.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// A single event could not be decoded.
    #[error(transparent)]
    Event(#[from] EventError),

    /// A batch or sync container could not be decoded.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A success response whose body is not JSON.
    #[error("response body is not JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),
}

impl LatticeError {
    /// The homeserver's error, if this is one.
    pub fn as_matrix(&self) -> Option<&MatrixError> {
        match self {
            Self::Matrix(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use lattice_errors::ErrorKind;

    use super::*;

    #[test]
    fn test_from_matrix_error() {
        let err = MatrixError::new(404, ErrorKind::NotFound, "no such room");
        let lattice_err: LatticeError = err.into();
        assert!(matches!(lattice_err, LatticeError::Matrix(_)));
        assert_eq!(lattice_err.to_string(), "404 M_NOT_FOUND: no such room");
        assert_eq!(lattice_err.as_matrix().unwrap().status, 404);
    }

    #[test]
    fn test_from_classify_error() {
        let err = lattice_errors::classify(500, b"oops").unwrap_err();
        let lattice_err: LatticeError = err.into();
        assert!(matches!(lattice_err, LatticeError::Classify(_)));
        assert!(lattice_err.as_matrix().is_none());
    }

    #[test]
    fn test_from_event_error() {
        let err = lattice_events::decode_event(serde_json::json!({})).unwrap_err();
        let lattice_err: LatticeError = err.into();
        assert!(matches!(lattice_err, LatticeError::Event(_)));
        assert!(lattice_err.to_string().contains("missing `type`"));
    }

    #[test]
    fn test_from_sync_error() {
        let err = lattice_sync::decode_events(
            serde_json::json!({}),
            &lattice_sync::BatchConfig::default(),
        )
        .unwrap_err();
        let lattice_err: LatticeError = err.into();
        assert!(matches!(lattice_err, LatticeError::Sync(_)));
    }
}
