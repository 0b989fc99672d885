//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Writing it back (used by tests and by anyone scripting a first-run setup).
//! - Providing defaults when the file does not exist yet (first run).
//! - Turning the raw file values into validated runtime settings for the
//!   auth client, the discovery engine and the HTTP transport.

pub mod config;
