//! Application layer use cases for the Portal client.
//!
//! # What use cases does the client have?
//!
//! - **`auth_client`** – Sends one login or register request and folds every
//!   possible outcome (transport failure, HTTP error status, undecodable
//!   body, server refusal, success) into a single `AuthResult`.
//!
//! - **`auth_session`** – Wraps an `AuthClient` in an observable state cell
//!   (`Idle → Loading → Success | Error`) and guarantees that at most one
//!   request is in flight per session.
//!
//! - **`discover_addresses`** – Looks for a global IPv6 address on the
//!   configured local interface and falls back to a remote lookup service
//!   when none is bound.
//!
//! The I/O these use cases need is reached through two ports defined here,
//! [`transport::Transport`] and [`discover_addresses::InterfaceSource`], so
//! that the whole layer can be tested without a network.

pub mod auth_client;
pub mod auth_session;
pub mod discover_addresses;
pub mod submission;
pub mod transport;
