//! Wire-level vocabulary of the account server.
//!
//! # Two reply shapes, one decoded form
//!
//! The server answers login and register with differently shaped JSON:
//!
//! ```json
//! {"success": true,  "message": "welcome", "nickname": "Al"}   // login
//! {"status": "success", "message": "ok"}                       // register
//! ```
//!
//! Each shape has its own serde struct ([`LoginReply`], [`RegisterReply`]),
//! and both fold into one [`AuthReply`].  The only thing that differs per
//! operation is *which* field is the required success flag and what type it
//! has; [`ReplyShape`] picks the struct.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::auth::{AuthOperation, Credentials, RegistrationRequest};

/// Value of the register reply's `status` field that signals success.
pub const REGISTER_SUCCESS_STATUS: &str = "success";

// ── Requests ──────────────────────────────────────────────────────────────────

/// Body of a login request: `{"username": .., "password": ..}`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginRequest<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            username: &credentials.username,
            password: &credentials.password,
        }
    }
}

/// Body of a register request: `{"nickname": .., "username": .., "password": ..}`.
#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub nickname: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a RegistrationRequest> for RegisterRequest<'a> {
    fn from(request: &'a RegistrationRequest) -> Self {
        Self {
            nickname: &request.nickname,
            username: &request.username,
            password: &request.password,
        }
    }
}

// ── Replies ───────────────────────────────────────────────────────────────────

/// Which reply format to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Required boolean `success`.
    Login,
    /// Required string `status`; success iff it equals `"success"`.
    Register,
}

impl From<AuthOperation> for ReplyShape {
    fn from(op: AuthOperation) -> Self {
        match op {
            AuthOperation::Login => ReplyShape::Login,
            AuthOperation::Register => ReplyShape::Register,
        }
    }
}

/// Login reply as sent by the server.
#[derive(Debug, Deserialize)]
pub struct LoginReply {
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub nickname: Option<String>,
}

/// Register reply as sent by the server.
#[derive(Debug, Deserialize)]
pub struct RegisterReply {
    pub status: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// A decoded reply, independent of which shape it arrived in.
///
/// Optional fields that are absent, `null`, or of the wrong JSON type decode
/// as `None`; only the success flag is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReply {
    pub success: bool,
    pub message: Option<String>,
    pub nickname: Option<String>,
}

impl From<LoginReply> for AuthReply {
    fn from(reply: LoginReply) -> Self {
        Self {
            success: reply.success,
            message: reply.message,
            nickname: reply.nickname,
        }
    }
}

impl From<RegisterReply> for AuthReply {
    fn from(reply: RegisterReply) -> Self {
        Self {
            success: reply.status == REGISTER_SUCCESS_STATUS,
            message: reply.message,
            nickname: None,
        }
    }
}

/// A string, or anything else (which is dropped).
#[derive(Deserialize)]
#[serde(untagged)]
enum Text {
    Text(String),
    Other(IgnoredAny),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Text::deserialize(deserializer)? {
        Text::Text(text) => Some(text),
        Text::Other(_) => None,
    })
}
