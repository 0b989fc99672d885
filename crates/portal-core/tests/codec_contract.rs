//! Integration tests for the portal-core reply codec.
//!
//! These tests drive the public API the way `portal-client` does: encode a
//! request, hand an arbitrary server body to `decode_reply`, and map the
//! outcome through `AuthState`.  They cover the reply contract for both
//! operations rather than individual helper functions.

use portal_core::{
    decode_reply, encode_register, AuthResult, AuthState, DecodeErrorKind, ErrorKind,
    RegistrationRequest, ReplyShape,
};

// ── Login shape ───────────────────────────────────────────────────────────────

#[test]
fn test_login_reply_nickname_is_preserved_exactly() {
    for nickname in ["Al", "", "名字", "with space", "emoji 🦀"] {
        let body = serde_json::json!({"success": true, "nickname": nickname}).to_string();

        let reply = decode_reply(ReplyShape::Login, body.as_bytes()).expect("decode");

        assert!(reply.success);
        assert_eq!(reply.nickname.as_deref(), Some(nickname));
    }
}

#[test]
fn test_login_reply_with_false_flag_never_decodes_as_success() {
    let bodies = [
        r#"{"success":false}"#,
        r#"{"success":false,"message":"bad credentials"}"#,
        r#"{"success":false,"nickname":"Al"}"#,
    ];

    for body in bodies {
        let reply = decode_reply(ReplyShape::Login, body.as_bytes()).expect("decode");
        assert!(!reply.success, "{body} must not decode as success");
    }
}

#[test]
fn test_malformed_json_bodies_yield_invalid_json_not_panic() {
    let bodies: [&[u8]; 6] = [
        b"",
        b"{",
        b"<html>502 Bad Gateway</html>",
        b"{\"success\": true,}",
        b"\xff\xfe\x00",
        b"null garbage",
    ];

    for body in bodies {
        for shape in [ReplyShape::Login, ReplyShape::Register] {
            let err = decode_reply(shape, body).expect_err("must not decode");
            assert_eq!(err.kind, DecodeErrorKind::InvalidJson, "body {body:?}");
            assert!(!err.detail.is_empty());
        }
    }
}

#[test]
fn test_well_formed_json_without_object_is_malformed_body() {
    for body in ["null", "true", "42", "\"ok\"", "[]"] {
        let err = decode_reply(ReplyShape::Login, body.as_bytes()).expect_err("must fail");
        assert_eq!(err.kind, DecodeErrorKind::MalformedBody, "body {body}");
    }
}

// ── Register shape ────────────────────────────────────────────────────────────

#[test]
fn test_register_reply_is_read_through_status_field() {
    // A login-shaped body is not a valid register reply.
    let err = decode_reply(ReplyShape::Register, br#"{"success":true}"#).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::MalformedBody);

    let ok = decode_reply(ReplyShape::Register, br#"{"status":"success","message":"ok"}"#)
        .expect("decode");
    assert!(ok.success);
    assert_eq!(ok.message.as_deref(), Some("ok"));
}

#[test]
fn test_register_request_body_matches_wire_contract() {
    let body = encode_register(&RegistrationRequest::new("Al", "alice", "pw")).expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("valid JSON");

    let object = value.as_object().expect("object");
    assert_eq!(object.len(), 3);
    assert_eq!(object["nickname"], "Al");
    assert_eq!(object["username"], "alice");
    assert_eq!(object["password"], "pw");
}

// ── State mapping ─────────────────────────────────────────────────────────────

#[test]
fn test_every_failure_kind_maps_to_non_empty_single_line_error() {
    let details = ["", "boom", "line one\nline two", "   \n\t"];
    let kinds = [
        ErrorKind::Network,
        ErrorKind::Server,
        ErrorKind::Protocol,
        ErrorKind::Application,
    ];

    for kind in kinds {
        for detail in details {
            let state = AuthState::from(AuthResult::failure(kind, detail));
            let AuthState::Error(message) = state else {
                panic!("failure must map to an error state");
            };
            assert!(!message.trim().is_empty());
            assert!(!message.contains('\n'));
        }
    }
}
