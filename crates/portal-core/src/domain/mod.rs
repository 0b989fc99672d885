//! Domain layer: plain values shared by the auth and discovery subsystems.
//!
//! Nothing in here performs I/O.  Types are immutable once built, except for
//! the two state enums, which are stored in exactly one observable cell per
//! session by the `portal-client` state machines.

pub mod auth;
pub mod discovery;
