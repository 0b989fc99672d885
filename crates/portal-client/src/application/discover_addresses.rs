//! DiscoveryEngine: finds a usable global IPv6 address for this device.
//!
//! # Algorithm
//!
//! 1. Enumerate local interfaces and keep only those whose name matches the
//!    configured [`InterfaceMatcher`].  Non-matching interfaces are skipped
//!    entirely.
//! 2. From the matching interfaces keep IPv6 addresses only.
//! 3. Drop link-local addresses (`fe80::/10`).
//! 4. A non-empty result is final; the remote lookup is not consulted.
//! 5. Otherwise issue one GET to the lookup service, trim the body and parse
//!    it as a single address.
//!
//! # Failure policy
//!
//! Discovery is best effort.  A failed local enumeration is logged and
//! treated as "no local addresses".  A failed remote lookup (transport error,
//! non-2xx status, or a body that is not an IPv6 address) yields
//! `Ready([])`.  Only when *both* sources fail is the result
//! [`DiscoveryState::Error`].
//!
//! The two phases never overlap: the remote call is issued only after local
//! enumeration has finished.
//!
//! # Single flight
//!
//! The engine starts out `Loading` with nothing running, so the state alone
//! cannot say whether a run is in progress; an `in_flight` flag does.  The
//! flag is only read or written inside the state channel's write lock: taken
//! together with the `Loading` write, cleared together with the terminal
//! write.  A receiver that observes a terminal state can therefore refresh
//! straight away.

use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use portal_core::{Address, DiscoveryState};
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::submission::{
    Completion, SubmitError, Submission, INTERRUPTED_MESSAGE,
};
use crate::application::transport::{HttpRequest, Transport};

/// Interface name used when none is configured.
pub const DEFAULT_INTERFACE: &str = "wlan0";

/// One address bound to one local interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
    pub ip: IpAddr,
}

/// Enumerates the addresses bound to this machine's network interfaces.
///
/// Implementations may block; the engine calls them on a blocking thread.
#[cfg_attr(test, mockall::automock)]
pub trait InterfaceSource: Send + Sync {
    /// Returns one entry per (interface, address) pair.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the interface list cannot be read.
    fn interfaces(&self) -> io::Result<Vec<LocalInterface>>;
}

/// Predicate over interface names.
///
/// `"wlan0"` matches only `wlan0`; `"wl*"` matches every name starting with
/// `wl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMatcher {
    pattern: String,
}

impl InterfaceMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, name: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => name == self.pattern,
        }
    }
}

impl Default for InterfaceMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_INTERFACE)
    }
}

/// Runtime settings for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    /// Plain-text lookup service answering with the caller's IPv6 address.
    pub lookup_url: String,
    pub interface: InterfaceMatcher,
}

/// Observable address-discovery state machine.
///
/// Cloning is cheap; clones share the same state cell.
#[derive(Clone)]
pub struct DiscoveryEngine {
    interfaces: Arc<dyn InterfaceSource>,
    transport: Arc<dyn Transport>,
    settings: Arc<DiscoverySettings>,
    state: Arc<watch::Sender<DiscoveryState>>,
    in_flight: Arc<AtomicBool>,
}

impl DiscoveryEngine {
    /// Creates an engine in the `Loading` state.  No lookup is started until
    /// [`refresh`](Self::refresh) or
    /// [`discover_addresses`](Self::discover_addresses) is called.
    pub fn new(
        interfaces: Arc<dyn InterfaceSource>,
        transport: Arc<dyn Transport>,
        settings: DiscoverySettings,
    ) -> Self {
        let (state, _) = watch::channel(DiscoveryState::Loading);
        Self {
            interfaces,
            transport,
            settings: Arc::new(settings),
            state: Arc::new(state),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Starts one discovery run in the background.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::AlreadyInFlight`] while a previous run is still
    /// going.
    pub fn refresh(&self) -> Result<Submission<DiscoveryState>, SubmitError> {
        if !self.try_begin() {
            debug!("discovery rejected: a lookup is already in flight");
            return Err(SubmitError::AlreadyInFlight);
        }

        let request_id = Uuid::new_v4();
        let state = Arc::clone(&self.state);
        let in_flight = Arc::clone(&self.in_flight);
        let (completion, submission) = Completion::channel(
            request_id,
            move |terminal| {
                state.send_modify(|current| {
                    *current = terminal;
                    in_flight.store(false, Ordering::Release);
                });
            },
            DiscoveryState::Error(INTERRUPTED_MESSAGE.to_string()),
        );
        let engine = self.clone();
        let span = info_span!("discovery", %request_id);

        tokio::spawn(
            async move {
                let terminal = engine.run().await;
                completion.complete(terminal);
            }
            .instrument(span),
        );

        Ok(submission)
    }

    /// Runs discovery and waits for the terminal state.
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh), plus [`SubmitError::Interrupted`]
    /// if the run panicked or the runtime shut down mid-run.
    pub async fn discover_addresses(&self) -> Result<DiscoveryState, SubmitError> {
        self.refresh()?.outcome().await
    }

    pub fn current_state(&self) -> DiscoveryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoveryState> {
        self.state.subscribe()
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    /// Claims the flag and moves the cell to `Loading` in one write.
    fn try_begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            let claimed = self
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();
            if claimed {
                *state = DiscoveryState::Loading;
            }
            claimed
        })
    }

    async fn run(&self) -> DiscoveryState {
        let local = self.local_addresses().await;

        if let Ok(addresses) = &local {
            if !addresses.is_empty() {
                info!(count = addresses.len(), "using local addresses");
                return DiscoveryState::Ready(addresses.clone());
            }
        }

        match (self.remote_address().await, local) {
            (Ok(remote), _) => DiscoveryState::Ready(remote.into_iter().collect()),
            (Err(remote_err), Ok(_)) => {
                info!("no address available: {remote_err}");
                DiscoveryState::Ready(Vec::new())
            }
            (Err(remote_err), Err(local_err)) => {
                warn!("discovery failed: {local_err}; {remote_err}");
                DiscoveryState::Error(format!(
                    "Could not determine an address: {remote_err}"
                ))
            }
        }
    }

    /// Steps 1-3.  Returns the enumeration error so the caller can tell
    /// "nothing found" from "could not look".
    async fn local_addresses(&self) -> io::Result<Vec<Address>> {
        let source = Arc::clone(&self.interfaces);
        let listed = tokio::task::spawn_blocking(move || source.interfaces())
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .and_then(|result| result);

        let interfaces = match listed {
            Ok(interfaces) => interfaces,
            Err(e) => {
                warn!("local interface enumeration failed, falling back to lookup: {e}");
                return Err(e);
            }
        };

        let matcher = &self.settings.interface;
        let addresses = interfaces
            .into_iter()
            .inspect(|iface| debug!(interface = %iface.name, ip = %iface.ip, "enumerated"))
            .filter(|iface| matcher.matches(&iface.name))
            .filter_map(|iface| Address::from_ip(iface.ip))
            .filter(|addr| !addr.is_link_local())
            .collect();

        Ok(addresses)
    }

    /// Step 5.  `Ok(None)` when the service answered with a blank body.
    async fn remote_address(&self) -> Result<Option<Address>, String> {
        let request = HttpRequest::get(&self.settings.lookup_url);
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| format!("lookup failed: {e}"))?;

        if !response.is_success() {
            return Err(format!("lookup failed: {}", response.status_line()));
        }

        let body = String::from_utf8_lossy(&response.body);
        let body = body.trim();
        debug!(body, "lookup service replied");
        if body.is_empty() {
            return Ok(None);
        }

        body.parse::<Address>()
            .map(Some)
            .map_err(|e| format!("lookup failed: {e}"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
