//! Typed classification of homeserver error responses.
//!
//! A non-2xx response carries a JSON body with `errcode` and `error`. This
//! crate maps it to a [`MatrixError`] with one [`ErrorKind`] per known
//! errcode and a catch-all for the rest:
//!
//! - **Kinds** ([`ErrorKind`]): the errcode taxonomy, including the fields
//!   some errcodes carry (`retry_after_ms` on `M_LIMIT_EXCEEDED`).
//! - **Classifier** ([`classify`], [`classify_value`]): status + body to
//!   `MatrixError`, or a [`ClassifyError`] when the body is not an error
//!   body at all.
//! - **Challenges** ([`UiaChallenge`]): the interactive-auth body, which is
//!   carved out before classification.
//!
//! Classification is pure: it never retries, sleeps, or logs.

mod classify;
mod error;
mod kind;
mod matrix;
mod uia;

pub use classify::{classify, classify_value};
pub use error::ClassifyError;
pub use kind::ErrorKind;
pub use matrix::MatrixError;
pub use uia::{AuthFlow, UiaChallenge};
