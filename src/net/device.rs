/*!
 * Network Devices
 * Name-keyed device table consumed by SO_BINDTODEVICE
 */

use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A network interface as seen by the socket layer.
///
/// Drivers own the real device state; the socket layer only holds a
/// reference so bound-device lookups and option reads have a name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetDevice {
    pub name: String,
    pub index: u32,
    pub mtu: u32,
}

impl NetDevice {
    pub fn new(name: impl Into<String>, index: u32, mtu: u32) -> Self {
        Self {
            name: name.into(),
            index,
            mtu,
        }
    }
}

/// Resolves interface names to device references
pub trait DeviceResolver: Send + Sync {
    fn by_name(&self, name: &str) -> Option<Arc<NetDevice>>;
}

/// In-memory device table
pub struct DeviceTable {
    devices: DashMap<String, Arc<NetDevice>, RandomState>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self {
            devices: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Register a device; replaces any previous device with the same name
    pub fn register(&self, device: NetDevice) -> Arc<NetDevice> {
        let device = Arc::new(device);
        self.devices
            .insert(device.name.clone(), Arc::clone(&device));
        device
    }

    /// Remove a device by name
    pub fn unregister(&self, name: &str) -> Option<Arc<NetDevice>> {
        self.devices.remove(name).map(|(_, dev)| dev)
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceResolver for DeviceTable {
    fn by_name(&self, name: &str) -> Option<Arc<NetDevice>> {
        self.devices.get(name).map(|entry| Arc::clone(entry.value()))
    }
}
