//! Address discovery domain types.
//!
//! An [`Address`] is always a parsed IPv6 address; anything else is rejected
//! at construction, so a `Vec<Address>` never needs re-validation downstream.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use thiserror::Error;

/// Longest slice of rejected input echoed back in an [`AddressError`].
const MAX_ECHOED_INPUT: usize = 64;

/// Error returned when text is not a valid IPv6 address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid IPv6 address: {input:?}")]
pub struct AddressError {
    pub input: String,
}

/// A validated IPv6 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(Ipv6Addr);

impl Address {
    pub fn new(ip: Ipv6Addr) -> Self {
        Self(ip)
    }

    /// Returns `Some` only for 128-bit addresses; IPv4 yields `None`.
    pub fn from_ip(ip: IpAddr) -> Option<Self> {
        match ip {
            IpAddr::V6(v6) => Some(Self(v6)),
            IpAddr::V4(_) => None,
        }
    }

    pub fn ip(&self) -> Ipv6Addr {
        self.0
    }

    /// `true` for addresses in `fe80::/10`.
    ///
    /// The range check is a superset of the textual `fe80:` prefix test: it
    /// also catches `fe81::` through `febf::`.
    pub fn is_link_local(&self) -> bool {
        (self.0.segments()[0] & 0xffc0) == 0xfe80
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Ipv6Addr>().map(Self).map_err(|_| AddressError {
            input: s.chars().take(MAX_ECHOED_INPUT).collect(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Ipv6Addr> for Address {
    fn from(ip: Ipv6Addr) -> Self {
        Self(ip)
    }
}

/// The observable state of the discovery engine.
///
/// Starts in `Loading`: the first lookup is issued as soon as the owning
/// screen opens, so there is no separate idle state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    #[default]
    Loading,
    /// Local addresses first, at most one remote-fallback address last.
    Ready(Vec<Address>),
    /// Both local enumeration and the remote lookup failed.
    Error(String),
}

impl DiscoveryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, DiscoveryState::Loading)
    }

    /// Addresses of a `Ready` state; empty for every other state.
    pub fn addresses(&self) -> &[Address] {
        match self {
            DiscoveryState::Ready(addresses) => addresses,
            _ => &[],
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
