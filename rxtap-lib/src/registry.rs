//! Attaches the receive handler to matching interfaces and detaches it again.
//!
//! Two locks are involved, never nested the other way round:
//!
//! ```text
//!   host enumeration lock (shared)      held for a whole interface walk
//!     └─ registry config lock (exclusive)   held around one register/unregister
//! ```
//!
//! Enumerations stay concurrent with each other; only the per-interface
//! registration step is serialized.
//!
//! # Invariant
//!
//! ```text
//! name ∈ intercepted  ⟹  the host holds our handler on name
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::classifier::FrameHandler;
use crate::error::RegistryError;
use crate::filter::InterfaceFilter;
use crate::host::{InterfaceDescriptor, NetHost, RegistrationHandle};

/// An interface currently holding our handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedInterface {
    pub name: String,
    pub handle: RegistrationHandle,
}

/// What one [`DeviceRegistry::attach_all`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachSummary {
    /// Newly registered interfaces.
    pub registered: usize,
    /// Matching interfaces that already held our handler.
    pub already_attached: usize,
    /// Matching interfaces the host refused.
    pub failed: usize,
    /// Tracked interfaces that no longer exist.
    pub pruned: usize,
}

pub struct DeviceRegistry {
    host: Arc<dyn NetHost>,
    filter: InterfaceFilter,
    handler: Arc<dyn FrameHandler>,
    intercepted: Mutex<HashMap<String, InterceptedInterface>>,
}

impl DeviceRegistry {
    pub fn new(
        host: Arc<dyn NetHost>,
        filter: InterfaceFilter,
        handler: Arc<dyn FrameHandler>,
    ) -> Self {
        Self { host, filter, handler, intercepted: Mutex::new(HashMap::new()) }
    }

    pub fn filter(&self) -> &InterfaceFilter {
        &self.filter
    }

    /// Register the handler on every matching interface not already holding it.
    ///
    /// Safe to call repeatedly; later passes pick up interfaces that appeared
    /// and forget tracked ones that disappeared. Host refusals are logged and
    /// skipped, never returned.
    pub fn attach_all(&self) -> AttachSummary {
        let mut summary = AttachSummary::default();
        let mut present = HashSet::new();
        // Only entries tracked before this walk may be pruned by it; anything
        // registered meanwhile by another pass was seen by that pass's walk.
        let tracked_before: HashMap<String, RegistrationHandle> =
            self.lock().iter().map(|(name, entry)| (name.clone(), entry.handle.clone())).collect();

        self.host.for_each_interface(&mut |iface| {
            debug!(interface = %iface.name, index = iface.index, "found interface");
            present.insert(iface.name.clone());
            if !self.filter.matches(&iface.name) {
                return;
            }
            match self.attach_one(iface) {
                Ok(true) => summary.registered += 1,
                Ok(false) => summary.already_attached += 1,
                Err(err) => {
                    summary.failed += 1;
                    match &err {
                        RegistryError::RegistrationConflict { .. } => {
                            warn!(interface = %iface.name, error = %err, "interface busy, skipping");
                        }
                        RegistryError::RegistrationFailed { .. } => {
                            warn!(interface = %iface.name, error = %err, "could not register handler");
                        }
                    }
                }
            }
        });

        summary.pruned = self.prune_missing(&tracked_before, &present);

        info!(
            filter = self.filter.target(),
            registered = summary.registered,
            already_attached = summary.already_attached,
            failed = summary.failed,
            pruned = summary.pruned,
            "attach pass complete"
        );
        summary
    }

    fn attach_one(&self, iface: &InterfaceDescriptor) -> Result<bool, RegistryError> {
        let mut intercepted = self.lock();
        if intercepted.contains_key(&iface.name) {
            debug!(interface = %iface.name, "handler already registered");
            return Ok(false);
        }

        let handle = self
            .host
            .register(iface, Arc::clone(&self.handler))
            .map_err(|e| RegistryError::from_host(&iface.name, e))?;

        info!(interface = %iface.name, index = iface.index, "handler registered");
        intercepted
            .insert(iface.name.clone(), InterceptedInterface { name: iface.name.clone(), handle });
        Ok(true)
    }

    fn prune_missing(
        &self,
        tracked_before: &HashMap<String, RegistrationHandle>,
        present: &HashSet<String>,
    ) -> usize {
        let mut intercepted = self.lock();
        let gone: Vec<String> = intercepted
            .iter()
            .filter(|(name, entry)| {
                !present.contains(*name) && tracked_before.get(*name) == Some(&entry.handle)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in &gone {
            if let Some(entry) = intercepted.remove(name) {
                self.host.unregister(&entry.handle);
                info!(interface = %name, "interface disappeared, registration dropped");
            }
        }
        gone.len()
    }

    /// Unregister the handler from every interface this registry attached.
    ///
    /// Interfaces never attached are left alone, so calling this with nothing
    /// tracked does nothing. Returns the number of registrations released.
    pub fn detach_all(&self) -> usize {
        let mut released = 0;

        self.host.for_each_interface(&mut |iface| {
            if self.detach_one(&iface.name) {
                released += 1;
            }
        });

        // Tracked entries the walk did not reach belong to interfaces that
        // vanished after attach; release their handles as well.
        let mut intercepted = self.lock();
        for (name, entry) in intercepted.drain() {
            self.host.unregister(&entry.handle);
            debug!(interface = %name, "released handle of missing interface");
            released += 1;
        }

        released
    }

    fn detach_one(&self, name: &str) -> bool {
        let mut intercepted = self.lock();
        let Some(entry) = intercepted.remove(name) else {
            return false;
        };
        self.host.unregister(&entry.handle);
        info!(interface = name, "handler unregistered");
        true
    }

    /// Forget `name` after the host reported it gone. Returns whether it was tracked.
    pub fn interface_removed(&self, name: &str) -> bool {
        let mut intercepted = self.lock();
        match intercepted.remove(name) {
            Some(entry) => {
                self.host.unregister(&entry.handle);
                info!(interface = name, "interface removed, registration dropped");
                true
            }
            None => false,
        }
    }

    pub fn is_intercepted(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of intercepted interfaces, sorted.
    pub fn intercepted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, InterceptedInterface>> {
        self.intercepted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DeviceRegistry {
    fn drop(&mut self) {
        let tracked = !self.lock().is_empty();
        if tracked {
            let released = self.detach_all();
            info!(released, "registry dropped, handlers released");
        }
    }
}
