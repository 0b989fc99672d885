//! JSON codec for account requests and replies.
//!
//! Request bodies are the serde structs of [`messages`](crate::protocol::messages)
//! written with `serde_json::to_vec`.
//!
//! Decoding never panics.  It distinguishes two failure kinds, following
//! `serde_json::Error::classify`:
//!
//! - [`DecodeErrorKind::InvalidJson`] – the bytes are not JSON at all (the
//!   detail is the parser's own message, including line/column).
//! - [`DecodeErrorKind::MalformedBody`] – valid JSON, but not an object, or
//!   the required success flag is missing or has the wrong type.

use std::fmt;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::error::Category;
use thiserror::Error;
use tracing::debug;

use crate::domain::auth::{Credentials, RegistrationRequest};
use crate::protocol::messages::{
    AuthReply, LoginReply, LoginRequest, RegisterReply, RegisterRequest, ReplyShape,
};

/// `Content-Type` sent with every encoded request body.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Error produced when a request body cannot be serialised.
#[derive(Debug, Error)]
#[error("could not encode request: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Category of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    InvalidJson,
    MalformedBody,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::InvalidJson => f.write_str("invalid JSON"),
            DecodeErrorKind::MalformedBody => f.write_str("malformed body"),
        }
    }
}

/// Error produced when a reply body cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub detail: String,
}

impl DecodeError {
    fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: DecodeErrorKind::MalformedBody,
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        let kind = match e.classify() {
            Category::Data => DecodeErrorKind::MalformedBody,
            Category::Syntax | Category::Eof | Category::Io => DecodeErrorKind::InvalidJson,
        };
        Self {
            kind,
            detail: e.to_string(),
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes `{"username": .., "password": ..}`.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialisation fails.
pub fn encode_login(credentials: &Credentials) -> Result<Vec<u8>, EncodeError> {
    encode(&LoginRequest::from(credentials))
}

/// Encodes `{"nickname": .., "username": .., "password": ..}`.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialisation fails.
pub fn encode_register(request: &RegistrationRequest) -> Result<Vec<u8>, EncodeError> {
    encode(&RegisterRequest::from(request))
}

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(body)?)
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decodes a reply body of the given shape into an [`AuthReply`].
///
/// # Errors
///
/// Returns [`DecodeErrorKind::InvalidJson`] when `body` is not JSON, and
/// [`DecodeErrorKind::MalformedBody`] when it is not an object or the success
/// flag named by `shape` is absent or mistyped.
///
/// # Examples
///
/// ```rust
/// use portal_core::{decode_reply, ReplyShape};
///
/// let reply = decode_reply(ReplyShape::Login, br#"{"success":true,"nickname":"Al"}"#).unwrap();
/// assert!(reply.success);
/// assert_eq!(reply.nickname.as_deref(), Some("Al"));
/// ```
pub fn decode_reply(shape: ReplyShape, body: &[u8]) -> Result<AuthReply, DecodeError> {
    let reply = match shape {
        ReplyShape::Login => decode::<LoginReply>(body)?.into(),
        ReplyShape::Register => decode::<RegisterReply>(body)?.into(),
    };
    Ok(reply)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    // Syntax over the whole body comes first, so `null garbage` is invalid
    // JSON rather than a mistyped reply.
    serde_json::from_slice::<IgnoredAny>(body)?;

    // Derived structs also accept positional arrays; replies are objects only.
    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'{') {
        debug!("reply is well-formed JSON but not an object");
        return Err(DecodeError::malformed("expected a JSON object"));
    }

    Ok(serde_json::from_slice(body)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
