//! get_if_addrs-backed [`InterfaceSource`].

use std::io;

use tracing::trace;

use crate::application::discover_addresses::{InterfaceSource, LocalInterface};

/// Reads the interface table of the running machine.
///
/// The call is a blocking syscall (`getifaddrs` on Unix,
/// `GetAdaptersAddresses` on Windows); the discovery engine runs it on a
/// blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<LocalInterface>> {
        let table = get_if_addrs::get_if_addrs()?;
        trace!(entries = table.len(), "read interface table");
        Ok(table
            .into_iter()
            .map(|iface| LocalInterface {
                ip: iface.ip(),
                name: iface.name,
            })
            .collect())
    }
}
