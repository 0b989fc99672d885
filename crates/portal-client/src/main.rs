//! Portal client: command-line entry point.
//!
//! Drives the same auth session and discovery engine a graphical front end
//! would, one command per invocation, and prints the terminal state.
//!
//! # Usage
//!
//! ```text
//! portal-client [OPTIONS] <COMMAND>
//!
//! Commands:
//!   login     Log in with a username and password
//!   register  Create a new account
//!   discover  Print this device's global IPv6 addresses
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --auth-url <URL>       Base URL of the account server
//!   --lookup-url <URL>     Remote IPv6 lookup service
//!   --interface <NAME>     Interface to read addresses from ("wl*" = prefix)
//!   --json                 Print the final state as JSON
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Overrides                 |
//! |---------------------|---------------------------|
//! | `PORTAL_CONFIG`     | `--config`                |
//! | `PORTAL_AUTH_URL`   | `auth.base_url`           |
//! | `PORTAL_LOOKUP_URL` | `discovery.lookup_url`    |
//! | `PORTAL_INTERFACE`  | `discovery.interface`     |
//! | `PORTAL_PASSWORD`   | `--password`              |
//! | `RUST_LOG`          | `logging.level`           |
//!
//! CLI args take precedence over environment variables, which take
//! precedence over the config file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use portal_core::{AuthState, DiscoveryState};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use portal_client::application::auth_client::AuthClient;
use portal_client::application::auth_session::AuthSession;
use portal_client::application::discover_addresses::DiscoveryEngine;
use portal_client::infrastructure::http::HttpTransport;
use portal_client::infrastructure::interfaces::SystemInterfaces;
use portal_client::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use portal_client::infrastructure::ui_bridge::{AuthStatusDto, DiscoveryStatusDto};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Portal account and address-discovery client.
#[derive(Debug, Parser)]
#[command(name = "portal-client", about = "Portal account and address-discovery client", version)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// When absent, the platform config directory is used; a missing file
    /// means built-in defaults.
    #[arg(long, global = true, env = "PORTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the account server (e.g. `http://host:8888/api/`).
    #[arg(long, global = true, env = "PORTAL_AUTH_URL")]
    auth_url: Option<String>,

    /// URL of the plain-text IPv6 lookup service.
    #[arg(long, global = true, env = "PORTAL_LOOKUP_URL")]
    lookup_url: Option<String>,

    /// Interface name to read local addresses from; a trailing `*` matches
    /// by prefix.
    #[arg(long, global = true, env = "PORTAL_INTERFACE")]
    interface: Option<String>,

    /// Print the final state as a JSON snapshot instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in with a username and password.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a new account.
    Register {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print this device's global IPv6 addresses.
    Discover,
}

impl Cli {
    /// Loads the config file and applies the CLI/env overrides on top.
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };

        if let Some(url) = &self.auth_url {
            config.auth.base_url = url.clone();
        }
        if let Some(url) = &self.lookup_url {
            config.discovery.lookup_url = url.clone();
        }
        if let Some(interface) = &self.interface {
            config.discovery.interface = interface.clone();
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins when present; otherwise the configured level applies.
    // Logs go to stderr so `--json` output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    debug!(?config, "configuration resolved");

    let transport = Arc::new(
        HttpTransport::new(config.transport_settings()?).context("failed to build HTTP client")?,
    );

    match cli.command {
        Command::Login { username, password } => {
            let session = auth_session(&config, transport)?;
            let state = session.submit_login(username, password)?.outcome().await?;
            report_auth(&state, cli.json)
        }
        Command::Register {
            nickname,
            username,
            password,
        } => {
            let session = auth_session(&config, transport)?;
            let state = session
                .submit_register(nickname, username, password)?
                .outcome()
                .await?;
            report_auth(&state, cli.json)
        }
        Command::Discover => {
            let engine = DiscoveryEngine::new(
                Arc::new(SystemInterfaces),
                transport,
                config.discovery_settings()?,
            );
            info!(interface = engine.settings().interface.pattern(), "discovering addresses");
            let state = engine.discover_addresses().await?;
            report_discovery(&state, cli.json)
        }
    }
}

fn auth_session(config: &AppConfig, transport: Arc<HttpTransport>) -> anyhow::Result<AuthSession> {
    let client = AuthClient::new(transport, config.auth_endpoints()?);
    info!(login_url = %client.endpoints().login_url, "using account server");
    Ok(AuthSession::new(Arc::new(client)))
}

// ── Output ────────────────────────────────────────────────────────────────────

fn report_auth(state: &AuthState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&AuthStatusDto::from(state))?);
    }

    match state {
        AuthState::Success { nickname, message } => {
            if !json {
                println!("Welcome {nickname}");
                if let Some(message) = message {
                    println!("{message}");
                }
            }
            Ok(())
        }
        AuthState::Error(message) => bail!("{message}"),
        AuthState::Idle | AuthState::Loading => bail!("request ended in non-terminal state"),
    }
}

fn report_discovery(state: &DiscoveryState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&DiscoveryStatusDto::from(state))?);
    }

    match state {
        DiscoveryState::Ready(addresses) => {
            if !json {
                if addresses.is_empty() {
                    println!("No global IPv6 address found");
                }
                for address in addresses {
                    println!("{address}");
                }
            }
            Ok(())
        }
        DiscoveryState::Error(message) => bail!("{message}"),
        DiscoveryState::Loading => bail!("discovery ended in non-terminal state"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
