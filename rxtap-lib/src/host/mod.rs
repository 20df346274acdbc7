//! Contract between the registry and the host networking stack.
//!
//! A host owns the interface list and the per-interface receive slot. The
//! registry only walks the list and installs or removes its handler.

pub mod memory;

use std::sync::Arc;

use crate::classifier::FrameHandler;
use crate::error::HostError;

/// An interface as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub index: u32,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self { name: name.into(), index }
    }
}

/// Token for one installed handler, required to remove it again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    interface: String,
    index: u32,
    id: u64,
}

impl RegistrationHandle {
    pub fn new(iface: &InterfaceDescriptor, id: u64) -> Self {
        Self { interface: iface.name.clone(), index: iface.index, id }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Interface enumeration plus receive-handler registration.
pub trait NetHost: Send + Sync {
    /// Visit every interface while holding the host's shared enumeration lock.
    ///
    /// Concurrent walks are allowed; structural changes to the list wait
    /// until the walk returns. `visit` may call [`NetHost::register`] and
    /// [`NetHost::unregister`], which must not take that lock exclusively.
    fn for_each_interface(&self, visit: &mut dyn FnMut(&InterfaceDescriptor));

    /// Install `handler` as the receive callback of `iface`.
    ///
    /// Fails with [`HostError::Busy`] when the interface already has one.
    fn register(
        &self,
        iface: &InterfaceDescriptor,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<RegistrationHandle, HostError>;

    /// Remove the handler installed under `handle`. Unknown or stale handles
    /// are ignored.
    fn unregister(&self, handle: &RegistrationHandle);

    /// Snapshot of the interface list.
    fn list(&self) -> Vec<InterfaceDescriptor> {
        let mut out = Vec::new();
        self.for_each_interface(&mut |iface| out.push(iface.clone()));
        out
    }
}
