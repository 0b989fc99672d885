//! TOML-based configuration for the Portal client.
//!
//! Reads and writes `AppConfig` at the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Portal\config.toml`
//! - Linux:    `~/.config/portal/config.toml`
//! - macOS:    `~/Library/Application Support/Portal/config.toml`
//!
//! Example file:
//!
//! ```toml
//! [auth]
//! base_url = "http://mask.ddns.net:8888/api/"
//! login_path = "loginUser.php"
//! register_path = "registerUser.php"
//!
//! [discovery]
//! lookup_url = "https://6.ipw.cn/"
//! interface = "wlan0"
//!
//! [transport]
//! connect_timeout_secs = 10
//! read_timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "some_fn")]`, and every section
//! `#[serde(default)]`, so a missing file, a missing section and a missing
//! key all fall back to the same values.
//!
//! # Validation
//!
//! The raw file is deliberately permissive.  URLs and timeouts are checked
//! once, when [`AppConfig::auth_endpoints`], [`AppConfig::discovery_settings`]
//! and [`AppConfig::transport_settings`] build the runtime settings.  Nothing
//! downstream re-validates them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::auth_client::AuthEndpoints;
use crate::application::discover_addresses::{DiscoverySettings, InterfaceMatcher};
use crate::infrastructure::http::TransportSettings;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A URL field is not an absolute http(s) URL.
    #[error("invalid URL in `{field}` ({value:?}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A timeout of zero seconds.
    #[error("`{field}` must be at least 1 second")]
    ZeroTimeout { field: &'static str },

    /// The interface pattern is empty.
    #[error("`discovery.interface` must not be empty")]
    EmptyInterface,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account server endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// Base URL the two paths are resolved against.  Keep the trailing `/`
    /// or the last path segment of the base is replaced.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_register_path")]
    pub register_path: String,
}

/// Address discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Plain-text service that answers with the caller's IPv6 address.
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,
    /// Interface name, or a prefix followed by `*` (e.g. `"wl*"`).
    #[serde(default = "default_interface")]
    pub interface: String,
}

/// HTTP timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransportConfig {
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://mask.ddns.net:8888/api/".to_string()
}
fn default_login_path() -> String {
    "loginUser.php".to_string()
}
fn default_register_path() -> String {
    "registerUser.php".to_string()
}
fn default_lookup_url() -> String {
    "https://6.ipw.cn/".to_string()
}
fn default_interface() -> String {
    crate::application::discover_addresses::DEFAULT_INTERFACE.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            register_path: default_register_path(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            lookup_url: default_lookup_url(),
            interface: default_interface(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Runtime settings ──────────────────────────────────────────────────────────

impl AppConfig {
    /// Resolves the login and register URLs against `auth.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the base URL is not an absolute
    /// http(s) URL or a path cannot be joined onto it.
    pub fn auth_endpoints(&self) -> Result<AuthEndpoints, ConfigError> {
        let base = parse_http_url("auth.base_url", &self.auth.base_url)?;
        let join = |field: &'static str, path: &str| {
            base.join(path)
                .map(String::from)
                .map_err(|e| ConfigError::InvalidUrl {
                    field,
                    value: path.to_string(),
                    reason: e.to_string(),
                })
        };

        Ok(AuthEndpoints {
            login_url: join("auth.login_path", &self.auth.login_path)?,
            register_url: join("auth.register_path", &self.auth.register_path)?,
        })
    }

    /// Builds the discovery engine settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] for a bad `lookup_url` and
    /// [`ConfigError::EmptyInterface`] for a blank interface pattern.
    pub fn discovery_settings(&self) -> Result<DiscoverySettings, ConfigError> {
        let lookup = parse_http_url("discovery.lookup_url", &self.discovery.lookup_url)?;
        let interface = self.discovery.interface.trim();
        if interface.is_empty() {
            return Err(ConfigError::EmptyInterface);
        }

        Ok(DiscoverySettings {
            lookup_url: lookup.into(),
            interface: InterfaceMatcher::new(interface),
        })
    }

    /// Builds the HTTP transport timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] if either timeout is zero.
    pub fn transport_settings(&self) -> Result<TransportSettings, ConfigError> {
        let secs = |field: &'static str, value: u64| {
            if value == 0 {
                Err(ConfigError::ZeroTimeout { field })
            } else {
                Ok(Duration::from_secs(value))
            }
        };

        Ok(TransportSettings {
            connect_timeout: secs(
                "transport.connect_timeout_secs",
                self.transport.connect_timeout_secs,
            )?,
            read_timeout: secs("transport.read_timeout_secs", self.transport.read_timeout_secs)?,
        })
    }
}

fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{other}`"))),
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the `Portal`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Portal"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("portal"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Portal")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
