//! portal-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does portal-client do? (for beginners)
//!
//! The Portal client talks to a small account server over HTTP and JSON.
//! Everything the user sees is driven by two observable values:
//!
//! 1. `AuthState` – whether a login or registration is idle, in progress,
//!    accepted (with the account's nickname) or rejected (with a message
//!    that is safe to show as-is).
//! 2. `DiscoveryState` – the device's globally routable IPv6 addresses,
//!    found either on the local wireless interface or, failing that, by
//!    asking a remote lookup service.
//!
//! Requests never block the caller.  Each `submit_*`/`refresh` call returns
//! immediately with a handle; the outcome is published to the state cell
//! when the request finishes.

/// Application layer: auth and discovery use cases.
pub mod application;

/// Infrastructure layer: HTTP, interface enumeration, config, and UI bridge.
pub mod infrastructure;
