//! Status + body to typed error.
//!
//! Classification is a pure function of the status and the body. A body
//! with `flows` is an interactive-auth challenge and is rejected before any
//! errcode lookup, whatever the status.

use serde_json::{Map, Value};

use crate::matrix::{ERRCODE, ERROR};
use crate::uia::FLOWS;
use crate::{ClassifyError, ErrorKind, MatrixError, UiaChallenge};

/// Classifies a raw error response body.
///
/// # Errors
/// - [`ClassifyError::InteractiveAuth`] if the body is a UIA challenge.
/// - [`ClassifyError::TransportDecode`] if the body is not JSON, not an
///   object, or lacks a string `errcode` or `error`.
pub fn classify(status: u16, body: &[u8]) -> Result<MatrixError, ClassifyError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ClassifyError::transport(status, format!("body is not JSON: {e}")))?;
    classify_value(status, value)
}

/// Classifies an already-parsed error response body.
///
/// # Errors
/// Same as [`classify`], minus the JSON parse step.
pub fn classify_value(status: u16, body: Value) -> Result<MatrixError, ClassifyError> {
    let Value::Object(mut object) = body else {
        return Err(ClassifyError::transport(status, "body is not a JSON object"));
    };

    if object.contains_key(FLOWS) {
        let challenge: UiaChallenge = serde_json::from_value(Value::Object(object))
            .map_err(|e| {
                ClassifyError::transport(status, format!("malformed auth challenge: {e}"))
            })?;
        return Err(ClassifyError::InteractiveAuth(Box::new(challenge)));
    }

    let errcode = required_string(&mut object, ERRCODE, status)?;
    let message = required_string(&mut object, ERROR, status)?;
    let kind = ErrorKind::from_errcode(&errcode, &mut object);

    Ok(MatrixError {
        status,
        kind,
        message,
        extra: object,
    })
}

fn required_string(
    object: &mut Map<String, Value>,
    key: &str,
    status: u16,
) -> Result<String, ClassifyError> {
    match object.remove(key) {
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ClassifyError::transport(
            status,
            format!("`{key}` is not a string"),
        )),
        None => Err(ClassifyError::transport(status, format!("missing `{key}`"))),
    }
}
