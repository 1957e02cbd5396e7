//! Integration tests for error response classification.

use std::time::Duration;

use lattice_errors::{ClassifyError, ErrorKind, classify, classify_value};
use serde_json::json;

// =========================================================================
// Known errcodes
// =========================================================================

#[test]
fn test_rate_limited_with_hint() {
    let body = br#"{"errcode":"M_LIMIT_EXCEEDED","error":"Too many requests","retry_after_ms":2000}"#;
    let err = classify(429, body).unwrap();
    assert_eq!(err.status, 429);
    assert_eq!(
        err.kind,
        ErrorKind::LimitExceeded {
            retry_after_ms: Some(2000)
        }
    );
    assert_eq!(err.retry_after(), Some(Duration::from_millis(2000)));
    assert_eq!(err.message, "Too many requests");
}

#[test]
fn test_rate_limited_with_float_hint() {
    let body = br#"{"errcode":"M_LIMIT_EXCEEDED","error":"Too many requests","retry_after_ms":2000.0}"#;
    let err = classify(429, body).unwrap();
    assert_eq!(err.retry_after(), Some(Duration::from_millis(2000)));
    assert!(err.extra.get("retry_after_ms").is_none());
}

#[test]
fn test_rate_limited_without_hint_is_unspecified() {
    let err = classify_value(429, json!({"errcode": "M_LIMIT_EXCEEDED", "error": "slow"})).unwrap();
    assert_eq!(err.kind, ErrorKind::LimitExceeded { retry_after_ms: None });
    assert_eq!(err.retry_after(), None);
}

#[test]
fn test_distinct_kinds() {
    let cases = [
        ("M_FORBIDDEN", ErrorKind::Forbidden),
        ("M_MISSING_TOKEN", ErrorKind::MissingToken),
        ("M_NOT_FOUND", ErrorKind::NotFound),
        ("M_USER_IN_USE", ErrorKind::UserInUse),
        ("M_GUEST_ACCESS_FORBIDDEN", ErrorKind::GuestAccessForbidden),
        ("M_CANNOT_LEAVE_SERVER_NOTICE_ROOM", ErrorKind::CannotLeaveServerNoticeRoom),
        ("M_UNKNOWN", ErrorKind::Generic),
    ];
    for (errcode, expected) in cases {
        let err = classify_value(400, json!({"errcode": errcode, "error": "e"})).unwrap();
        assert_eq!(err.kind, expected, "{errcode}");
        assert_eq!(err.errcode(), errcode);
    }
}

#[test]
fn test_soft_logout() {
    let err = classify_value(
        401,
        json!({"errcode": "M_UNKNOWN_TOKEN", "error": "expired", "soft_logout": true}),
    )
    .unwrap();
    assert_eq!(
        err.kind,
        ErrorKind::UnknownToken {
            soft_logout: Some(true)
        }
    );
}

// =========================================================================
// Unknown errcodes
// =========================================================================

#[test]
fn test_future_errcode_is_unknown() {
    let err = classify_value(
        400,
        json!({"errcode": "M_SOME_FUTURE_CODE", "error": "Something new"}),
    )
    .unwrap();
    assert_eq!(
        err.kind,
        ErrorKind::Unknown {
            errcode: "M_SOME_FUTURE_CODE".into()
        }
    );
    assert_eq!(err.message, "Something new");
}

#[test]
fn test_error_body_round_trip() {
    let body = json!({
        "errcode": "M_CONSENT_NOT_GIVEN",
        "error": "Please accept the terms",
        "consent_uri": "https://example.org/terms"
    });
    let err = classify_value(403, body.clone()).unwrap();
    assert_eq!(err.kind, ErrorKind::ConsentNotGiven);
    assert_eq!(err.to_json(), body);
}

// =========================================================================
// Non-error bodies
// =========================================================================

#[test]
fn test_uia_body_is_not_classified() {
    let body = json!({
        "flows": [{"stages": ["m.login.password"]}],
        "params": {},
        "session": "abc"
    });
    let err = classify_value(401, body).unwrap_err();
    let ClassifyError::InteractiveAuth(challenge) = err else {
        panic!("expected an interactive-auth challenge");
    };
    assert_eq!(challenge.session.as_deref(), Some("abc"));
    assert_eq!(challenge.flows[0].stages, vec!["m.login.password".to_string()]);
}

#[test]
fn test_transport_decode_failures() {
    for (status, body) in [
        (502, &b"Bad Gateway"[..]),
        (500, &b"[]"[..]),
        (400, &br#"{"error": "no code"}"#[..]),
    ] {
        let err = classify(status, body).unwrap_err();
        assert!(
            matches!(err, ClassifyError::TransportDecode { status: s, .. } if s == status),
            "status {status}"
        );
    }
}
