//! Command bridge between the Portal client and its UI.
//!
//! Exposes application-layer state (auth status, discovered addresses) to the
//! presentation layer through plain async command functions.  Only this
//! module is allowed to reference both the application layer and the
//! presentation layer.
//!
//! ```text
//! UI                                   Rust backend
//! ─────────────────────────────────────────────────────────────
//! submit_login({username, password}) ─►  AuthSession::submit_login
//!                                    ◄─  AuthStatusDto { state: "loading" }
//! get_auth_status()                  ─►  AuthSession::current_state
//!                                    ◄─  AuthStatusDto { state: "success", .. }
//! ```
//!
//! # DTOs (Data Transfer Objects)
//!
//! `AuthState` and `DiscoveryState` are Rust enums that live inside watch
//! channels.  The DTO structs are flat serialisable snapshots of them with a
//! lower-case `state` tag, safe to send across any IPC boundary.
//!
//! # `CommandResult<T>`
//!
//! All commands return `CommandResult<T>`, a unified envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//! A command "fails" only when it could not be carried out (blank form
//! fields, a request already in flight).  A login the server refused is a
//! *successful* command whose data has `state: "error"`.

use std::fmt;
use std::sync::Arc;

use portal_core::{AuthState, DiscoveryState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::auth_session::AuthSession;
use crate::application::discover_addresses::DiscoveryEngine;

/// Shown when a form is submitted with a blank field.
pub const MISSING_FIELDS_MESSAGE: &str = "All fields must be filled in.";

// ── Shared application state ──────────────────────────────────────────────────

/// Runtime state shared between commands.
///
/// Both members are internally synchronised, so no outer lock is needed.
pub struct AppState {
    pub auth: AuthSession,
    pub discovery: DiscoveryEngine,
}

impl AppState {
    pub fn new(auth: AuthSession, discovery: DiscoveryEngine) -> Arc<Self> {
        Arc::new(Self { auth, discovery })
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Login form as submitted by the UI.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginFormDto {
    pub username: String,
    pub password: String,
}

/// Registration form as submitted by the UI.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterFormDto {
    pub nickname: String,
    pub username: String,
    pub password: String,
}

// Forms carry passwords; print them like the domain requests do.
impl fmt::Debug for LoginFormDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginFormDto")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for RegisterFormDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterFormDto")
            .field("nickname", &self.nickname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Snapshot of an `AuthState`.
///
/// `state` is one of `"idle"`, `"loading"`, `"success"`, `"error"`.
/// `nickname` is set only for `"success"`; `message` carries the server
/// message on success and the error text on error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatusDto {
    pub state: String,
    pub nickname: Option<String>,
    pub message: Option<String>,
}

impl From<&AuthState> for AuthStatusDto {
    fn from(state: &AuthState) -> Self {
        let (tag, nickname, message) = match state {
            AuthState::Idle => ("idle", None, None),
            AuthState::Loading => ("loading", None, None),
            AuthState::Success { nickname, message } => {
                ("success", Some(nickname.clone()), message.clone())
            }
            AuthState::Error(message) => ("error", None, Some(message.clone())),
        };
        Self {
            state: tag.to_string(),
            nickname,
            message,
        }
    }
}

/// Snapshot of a `DiscoveryState`.
///
/// `state` is one of `"loading"`, `"ready"`, `"error"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStatusDto {
    pub state: String,
    /// Textual IPv6 addresses, local ones first.  Empty unless `"ready"`.
    pub addresses: Vec<String>,
    pub error: Option<String>,
}

impl From<&DiscoveryState> for DiscoveryStatusDto {
    fn from(state: &DiscoveryState) -> Self {
        let (tag, error) = match state {
            DiscoveryState::Loading => ("loading", None),
            DiscoveryState::Ready(_) => ("ready", None),
            DiscoveryState::Error(message) => ("error", Some(message.clone())),
        };
        Self {
            state: tag.to_string(),
            addresses: state.addresses().iter().map(ToString::to_string).collect(),
            error,
        }
    }
}

/// Unified response wrapper for commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Starts a login and returns the `loading` snapshot.
///
/// The UI follows up with [`get_auth_status`] to observe the outcome.
pub async fn submit_login(
    state: Arc<AppState>,
    form: LoginFormDto,
) -> CommandResult<AuthStatusDto> {
    if any_blank(&[form.username.as_str(), form.password.as_str()]) {
        return CommandResult::err(MISSING_FIELDS_MESSAGE);
    }

    match state.auth.submit_login(form.username, form.password) {
        Ok(submission) => {
            debug!(request_id = %submission.request_id(), "login submitted from UI");
            CommandResult::ok(AuthStatusDto::from(&state.auth.current_state()))
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Starts a registration and returns the `loading` snapshot.
pub async fn submit_register(
    state: Arc<AppState>,
    form: RegisterFormDto,
) -> CommandResult<AuthStatusDto> {
    if any_blank(&[
        form.nickname.as_str(),
        form.username.as_str(),
        form.password.as_str(),
    ]) {
        return CommandResult::err(MISSING_FIELDS_MESSAGE);
    }

    match state
        .auth
        .submit_register(form.nickname, form.username, form.password)
    {
        Ok(submission) => {
            debug!(request_id = %submission.request_id(), "register submitted from UI");
            CommandResult::ok(AuthStatusDto::from(&state.auth.current_state()))
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Returns the current auth snapshot.
pub async fn get_auth_status(state: Arc<AppState>) -> CommandResult<AuthStatusDto> {
    CommandResult::ok(AuthStatusDto::from(&state.auth.current_state()))
}

/// Starts a discovery run and returns the `loading` snapshot.
pub async fn refresh_addresses(state: Arc<AppState>) -> CommandResult<DiscoveryStatusDto> {
    match state.discovery.refresh() {
        Ok(submission) => {
            debug!(request_id = %submission.request_id(), "discovery refresh from UI");
            CommandResult::ok(DiscoveryStatusDto::from(&state.discovery.current_state()))
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Returns the current discovery snapshot.
pub async fn get_discovery_status(state: Arc<AppState>) -> CommandResult<DiscoveryStatusDto> {
    CommandResult::ok(DiscoveryStatusDto::from(&state.discovery.current_state()))
}

fn any_blank(fields: &[&str]) -> bool {
    fields.iter().any(|f| f.trim().is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
