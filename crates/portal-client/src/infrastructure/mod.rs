//! Infrastructure layer for the Portal client.
//!
//! Contains the adapters behind the application-layer ports plus the
//! presentation-facing command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `portal_core`, but MUST NOT be imported by the `application` or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`http`** – `HttpTransport`, the `Transport` implementation over a
//!   shared `reqwest::Client` with the configured connect/read timeouts.
//!
//! - **`interfaces`** – `SystemInterfaces`, the `InterfaceSource`
//!   implementation that reads the OS interface table.
//!
//! - **`storage`** – TOML configuration file and its conversion into
//!   validated runtime settings.
//!
//! - **`ui_bridge`** – Command handlers that expose auth and discovery state
//!   to a UI as serialisable snapshots.

pub mod http;
pub mod interfaces;
pub mod storage;
pub mod ui_bridge;
