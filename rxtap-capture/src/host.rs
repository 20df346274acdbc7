use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use rxtap_lib::classifier::FrameHandler;
use rxtap_lib::host::{InterfaceDescriptor, NetHost, RegistrationHandle};
use rxtap_lib::{CaptureConfig, HostError, LinkLayer};
use tracing::{debug, info, warn};

use crate::frame::{is_outgoing, network_payload};

/// A running receive thread.
struct Tap {
    id: u64,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Tap {
    fn shutdown(self, interface: &str) {
        self.stop.store(true, Ordering::Release);
        if self.thread.join().is_err() {
            warn!(interface, "receive thread panicked");
        }
    }
}

/// Host backed by Linux AF_PACKET sockets.
///
/// Each registration opens a datalink channel on the interface and runs one
/// receive thread that hands every frame to the registered handler. The
/// channel polls with `read_timeout`, which also bounds how long
/// [`NetHost::unregister`] waits for the thread to exit.
///
/// AF_PACKET sees both directions. With Ethernet framing, frames whose source
/// is the interface's own hardware address are skipped so only inbound
/// traffic is classified. Loopback has no such address: every packet on `lo`
/// is delivered once as sent and once as received, so it is reported twice.
pub struct PnetHost {
    link_layer: LinkLayer,
    read_timeout: Duration,
    /// Last enumeration, read-locked for the duration of a walk.
    interfaces: RwLock<Vec<InterfaceDescriptor>>,
    taps: Mutex<HashMap<String, Tap>>,
    next_id: AtomicU64,
}

impl PnetHost {
    pub fn new(link_layer: LinkLayer, read_timeout: Duration) -> Self {
        Self {
            link_layer,
            read_timeout,
            interfaces: RwLock::new(Vec::new()),
            taps: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.link_layer, Duration::from_millis(config.read_timeout_ms))
    }

    /// Interfaces with a running receive thread.
    pub fn active(&self) -> Vec<String> {
        let mut names: Vec<String> = self.taps().keys().cloned().collect();
        names.sort();
        names
    }

    fn refresh(&self) {
        let fresh: Vec<InterfaceDescriptor> = datalink::interfaces()
            .into_iter()
            .map(|i| InterfaceDescriptor::new(i.name, i.index))
            .collect();
        *self.interfaces.write().unwrap_or_else(PoisonError::into_inner) = fresh;
    }

    /// Look the interface up again rather than through `interfaces`: register
    /// runs inside a walk that already holds the read lock.
    fn find(&self, name: &str) -> Result<NetworkInterface, HostError> {
        datalink::interfaces()
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| HostError::NoSuchInterface(name.to_string()))
    }

    fn open(&self, iface: &NetworkInterface) -> Result<Box<dyn DataLinkReceiver>, HostError> {
        let config = datalink::Config { read_timeout: Some(self.read_timeout), ..Default::default() };
        match datalink::channel(iface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => Ok(rx),
            Ok(_) => Err(HostError::Rejected(format!("non-ethernet channel for {}", iface.name))),
            Err(source) => Err(HostError::Channel { interface: iface.name.clone(), source }),
        }
    }

    fn taps(&self) -> MutexGuard<'_, HashMap<String, Tap>> {
        self.taps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NetHost for PnetHost {
    fn for_each_interface(&self, visit: &mut dyn FnMut(&InterfaceDescriptor)) {
        self.refresh();
        let interfaces = self.interfaces.read().unwrap_or_else(PoisonError::into_inner);
        for iface in interfaces.iter() {
            visit(iface);
        }
    }

    fn register(
        &self,
        iface: &InterfaceDescriptor,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<RegistrationHandle, HostError> {
        let mut taps = self.taps();
        if taps.contains_key(&iface.name) {
            return Err(HostError::Busy(iface.name.clone()));
        }

        let found = self.find(&iface.name)?;
        let rx = self.open(&found)?;
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let interface = iface.name.clone();
            let stop = Arc::clone(&stop);
            let inbound = Inbound {
                link_layer: self.link_layer,
                own_mac: found.mac.map(|m| [m.0, m.1, m.2, m.3, m.4, m.5]),
            };
            thread::Builder::new()
                .name(format!("rxtap-{}", iface.name))
                .spawn(move || receive_loop(&interface, rx, &*handler, inbound, &stop))
                .map_err(|source| HostError::Channel { interface: iface.name.clone(), source })?
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        taps.insert(iface.name.clone(), Tap { id, stop, thread });
        info!(interface = %iface.name, link_layer = ?self.link_layer, "capture started");
        Ok(RegistrationHandle::new(iface, id))
    }

    fn unregister(&self, handle: &RegistrationHandle) {
        let tap = {
            let mut taps = self.taps();
            match taps.get(handle.interface()) {
                Some(tap) if tap.id == handle.id() => taps.remove(handle.interface()),
                _ => None,
            }
        };
        // Join outside the lock; this waits up to one read timeout.
        if let Some(tap) = tap {
            tap.shutdown(handle.interface());
            info!(interface = handle.interface(), "capture stopped");
        }
    }
}

impl Drop for PnetHost {
    fn drop(&mut self) {
        let taps: Vec<(String, Tap)> = self.taps().drain().collect();
        for (name, tap) in taps {
            tap.shutdown(&name);
        }
    }
}

/// Which received frames reach the handler, and from where.
#[derive(Clone, Copy)]
struct Inbound {
    link_layer: LinkLayer,
    own_mac: Option<[u8; 6]>,
}

impl Inbound {
    fn payload<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        if self.link_layer == LinkLayer::Ethernet && is_outgoing(frame, self.own_mac) {
            return None;
        }
        network_payload(frame, self.link_layer)
    }
}

fn receive_loop(
    interface: &str,
    mut rx: Box<dyn DataLinkReceiver>,
    handler: &dyn FrameHandler,
    inbound: Inbound,
    stop: &AtomicBool,
) {
    debug!(interface, "receive thread running");
    while !stop.load(Ordering::Acquire) {
        match rx.next() {
            Ok(frame) => {
                if let Some(packet) = inbound.payload(frame) {
                    handler.on_frame(packet);
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {}
            Err(e) => {
                warn!(interface, error = %e, "receive failed, capture thread exiting");
                return;
            }
        }
    }
    debug!(interface, "receive thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_skips_own_transmissions() {
        let own = [0x02, 0, 0, 0, 0, 0x02];
        let inbound = Inbound { link_layer: LinkLayer::Ethernet, own_mac: Some(own) };
        let mut frame = vec![0u8; 12];
        frame.extend([0x08, 0x00, 0x45]);

        assert_eq!(inbound.payload(&frame), Some(&[0x45][..]));
        frame[6..12].copy_from_slice(&own);
        assert_eq!(inbound.payload(&frame), None);

        let raw = Inbound { link_layer: LinkLayer::Raw, own_mac: Some(own) };
        assert_eq!(raw.payload(&frame), Some(&frame[..]));
    }
}
