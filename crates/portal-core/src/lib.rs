//! # portal-core
//!
//! Shared library for the Portal client containing the domain types that the
//! presentation layer observes and the JSON codec spoken by the account
//! server.
//!
//! This crate has zero dependencies on sockets, async runtimes, or OS APIs.
//! Everything that performs I/O lives in `portal-client`.
//!
//! # Architecture overview
//!
//! - **`domain`** – Values with no behaviour beyond validation: the
//!   credentials of one login attempt, the result of one request, and the two
//!   observable state cells (`AuthState`, `DiscoveryState`).
//!
//! - **`protocol`** – How those values look on the wire.  Requests are JSON
//!   objects; replies come in two historical shapes (`success`/`nickname` for
//!   login, `status`/`message` for registration) that are folded into one
//!   [`AuthReply`] by a single decode path.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `portal_core::AuthState` instead of `portal_core::domain::auth::AuthState`.
pub use domain::auth::{
    AuthOperation, AuthResult, AuthState, Credentials, ErrorKind, RegistrationRequest,
    UNKNOWN_NICKNAME,
};
pub use domain::discovery::{Address, AddressError, DiscoveryState};
pub use protocol::codec::{
    decode_reply, encode_login, encode_register, DecodeError, DecodeErrorKind, EncodeError,
    JSON_CONTENT_TYPE,
};
pub use protocol::messages::{AuthReply, ReplyShape};
