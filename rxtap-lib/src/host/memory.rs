//! In-process host with a scripted interface set.
//!
//! Stands in for the kernel when exercising the registry: interfaces can be
//! added and removed at runtime, foreign handlers can be planted to provoke
//! conflicts, and frames can be pushed through whatever handler is installed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::classifier::{Disposition, FrameHandler};
use crate::error::HostError;
use crate::host::{InterfaceDescriptor, NetHost, RegistrationHandle};

/// Handler planted by [`MemoryHost::occupy`], standing for another owner.
struct ForeignHandler;

impl FrameHandler for ForeignHandler {
    fn on_frame(&self, _: &[u8]) -> Disposition {
        Disposition::Continue
    }
}

struct Slot {
    id: u64,
    handler: Arc<dyn FrameHandler>,
}

pub struct MemoryHost {
    /// Guarded by the shared enumeration lock.
    interfaces: RwLock<Vec<InterfaceDescriptor>>,
    /// Installed receive handlers by interface name.
    slots: Mutex<HashMap<String, Slot>>,
    /// Interfaces whose next registrations are refused.
    refusing: Mutex<HashSet<String>>,
    next_index: AtomicU32,
    next_id: AtomicU64,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self {
            interfaces: RwLock::new(Vec::new()),
            slots: Mutex::new(HashMap::new()),
            refusing: Mutex::new(HashSet::new()),
            next_index: AtomicU32::new(1),
            next_id: AtomicU64::new(1),
            register_calls: AtomicUsize::new(0),
            unregister_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interfaces<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let host = Self::new();
        for name in names {
            host.add_interface(name);
        }
        host
    }

    pub fn add_interface(&self, name: impl Into<String>) -> InterfaceDescriptor {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let iface = InterfaceDescriptor::new(name, index);
        self.interfaces.write().unwrap_or_else(PoisonError::into_inner).push(iface.clone());
        iface
    }

    /// Remove an interface. Its receive handler goes away with it.
    pub fn remove_interface(&self, name: &str) -> bool {
        let mut interfaces = self.interfaces.write().unwrap_or_else(PoisonError::into_inner);
        let before = interfaces.len();
        interfaces.retain(|i| i.name != name);
        self.slots().remove(name);
        interfaces.len() != before
    }

    /// Install a handler owned by someone else on `name`.
    pub fn occupy(&self, name: &str) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots().insert(name.to_string(), Slot { id, handler: Arc::new(ForeignHandler) });
    }

    /// Refuse registrations on `name` until [`MemoryHost::accept`] is called.
    pub fn refuse(&self, name: &str) {
        self.refusing.lock().unwrap_or_else(PoisonError::into_inner).insert(name.to_string());
    }

    pub fn accept(&self, name: &str) {
        self.refusing.lock().unwrap_or_else(PoisonError::into_inner).remove(name);
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.slots().contains_key(name)
    }

    pub fn handler_count(&self) -> usize {
        self.slots().len()
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::Relaxed)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::Relaxed)
    }

    /// Deliver `frame` the way the host stack would. `None` when no handler
    /// is installed on `name`.
    pub fn deliver(&self, name: &str, frame: &[u8]) -> Option<Disposition> {
        // Clone out of the lock so the handler runs unlocked.
        let handler = self.slots().get(name).map(|slot| Arc::clone(&slot.handler))?;
        Some(handler.on_frame(frame))
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NetHost for MemoryHost {
    fn for_each_interface(&self, visit: &mut dyn FnMut(&InterfaceDescriptor)) {
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
        self.register_calls.fetch_add(1, Ordering::Relaxed);

        if self.refusing.lock().unwrap_or_else(PoisonError::into_inner).contains(&iface.name) {
            return Err(HostError::Rejected(format!("{} is refusing handlers", iface.name)));
        }

        let mut slots = self.slots();
        if slots.contains_key(&iface.name) {
            return Err(HostError::Busy(iface.name.clone()));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        slots.insert(iface.name.clone(), Slot { id, handler });
        Ok(RegistrationHandle::new(iface, id))
    }

    fn unregister(&self, handle: &RegistrationHandle) {
        self.unregister_calls.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots();
        // Only remove the slot this handle installed, never someone else's.
        if slots.get(handle.interface()).is_some_and(|slot| slot.id == handle.id()) {
            slots.remove(handle.interface());
        }
    }
}
