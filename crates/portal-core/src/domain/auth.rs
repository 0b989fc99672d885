//! Authentication domain types.
//!
//! # Lifecycle of one attempt
//!
//! ```text
//! Credentials ──► AuthClient::login ──► AuthResult ──► AuthState
//!  (transient)        (stateless)       (immutable)     (observable cell)
//! ```
//!
//! - [`Credentials`] / [`RegistrationRequest`] are created for one attempt and
//!   dropped as soon as the request completes.  Their `Debug` output never
//!   contains the password.
//! - [`AuthResult`] is produced exactly once per request.
//! - [`AuthState`] is the value the presentation layer watches.  The
//!   conversion `AuthResult -> AuthState` is where a failure becomes
//!   user-visible text, so it lives next to the type that carries it.

use std::fmt;

/// Nickname reported when a successful login reply does not carry one.
pub const UNKNOWN_NICKNAME: &str = "Unknown";

/// Username and password for a single login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Creates credentials for one login attempt.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields submitted when creating a new account.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub nickname: String,
    pub username: String,
    pub password: String,
}

impl RegistrationRequest {
    /// Creates a registration request for one attempt.
    pub fn new(
        nickname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("nickname", &self.nickname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which account operation a request performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOperation {
    Login,
    Register,
}

impl AuthOperation {
    /// Lower-case name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthOperation::Login => "login",
            AuthOperation::Register => "register",
        }
    }
}

impl fmt::Display for AuthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an auth request failed.
///
/// | Kind          | Raised when                                         |
/// |---------------|-----------------------------------------------------|
/// | `Network`     | DNS, connect, or timeout failure in the transport   |
/// | `Server`      | The exchange completed with a non-2xx HTTP status   |
/// | `Protocol`    | A 2xx body could not be decoded                     |
/// | `Application` | A well-formed reply explicitly reported failure     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Server,
    Protocol,
    Application,
}

impl ErrorKind {
    /// Fixed, user-safe description shown when no server message is available.
    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::Network => "Could not reach the server",
            ErrorKind::Server => "The server returned an error",
            ErrorKind::Protocol => "The server sent a response that could not be understood",
            ErrorKind::Application => "The request was refused by the server",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Server => "server",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Application => "application",
        };
        f.write_str(name)
    }
}

/// Outcome of exactly one login or register request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The server accepted the request.
    Success {
        /// Display name of the account.
        nickname: String,
        /// Server-supplied message, when the reply carried one.
        message: Option<String>,
    },
    /// The request failed; `detail` is diagnostic text attributed to `reason`.
    Failure { reason: ErrorKind, detail: String },
}

impl AuthResult {
    /// Shorthand for building a [`AuthResult::Failure`].
    pub fn failure(reason: ErrorKind, detail: impl Into<String>) -> Self {
        AuthResult::Failure {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthResult::Success { .. })
    }
}

/// The observable state of one auth session.
///
/// Transitions: `Idle → Loading → (Success | Error)`, and from either
/// terminal state back to `Loading` on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Idle,
    Loading,
    Success {
        nickname: String,
        message: Option<String>,
    },
    /// Human-readable, single-line, never empty.
    Error(String),
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    /// `true` for `Success` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Success { .. } | AuthState::Error(_))
    }
}

impl From<AuthResult> for AuthState {
    fn from(result: AuthResult) -> Self {
        match result {
            AuthResult::Success { nickname, message } => AuthState::Success { nickname, message },
            AuthResult::Failure { reason, detail } => {
                AuthState::Error(user_message(reason, &detail))
            }
        }
    }
}

/// Builds the text shown for a failure.
///
/// Application failures show the server's own message verbatim.  Every other
/// kind is prefixed with its fixed description so raw transport or parser text
/// is never shown without attribution.
fn user_message(reason: ErrorKind, detail: &str) -> String {
    let detail = first_line(detail);
    match (reason, detail.is_empty()) {
        (_, true) => reason.description().to_string(),
        (ErrorKind::Application, false) => detail.to_string(),
        (_, false) => format!("{}: {detail}", reason.description()),
    }
}

/// Returns the first non-blank line of `text`, trimmed.
fn first_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
