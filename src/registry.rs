// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of the devices managed in one room.
//!
//! The [`DeviceRegistry`] is filled once at startup, in configuration order,
//! and then shared read-only (typically behind an `Arc`) with the
//! [`EventAggregator`](crate::event::EventAggregator) and any command or query
//! surface. Registration takes `&mut self`, so concurrent readers never observe
//! a registry that is still being built.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use roomlink::{Capabilities, DeviceRegistry};
//! use roomlink::device::StatefulDevice;
//! use roomlink::types::DeviceId;
//!
//! let mut registry = DeviceRegistry::new();
//! let display = Arc::new(StatefulDevice::new(
//!     DeviceId::new("display-1").unwrap(),
//!     "Display 1",
//!     Capabilities::display(2),
//! ));
//!
//! registry.register(display.clone()).unwrap();
//! assert!(registry.register(display).is_err()); // duplicate id
//!
//! assert!(registry.lookup("display-1").is_some());
//! assert!(registry.lookup("display-2").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RoomConfig;
use crate::device::{DeviceHandle, StatefulDevice};
use crate::error::{Error, Result};
use crate::types::DeviceId;

/// Devices keyed by identifier, iterated in registration order.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: Vec<Arc<dyn DeviceHandle>>,
    index: HashMap<DeviceId, usize>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from configuration.
    ///
    /// Entries with a missing identifier or an identifier already used by an
    /// earlier entry are logged and skipped; the remaining devices are still
    /// registered. Returns the registry together with the concrete handles of
    /// the registered devices, in configuration order, so drivers can be
    /// attached to them.
    #[must_use]
    pub fn from_config(config: &RoomConfig) -> (Self, Vec<Arc<StatefulDevice>>) {
        let mut registry = Self::new();
        let mut handles = Vec::with_capacity(config.devices.len());

        for (position, entry) in config.devices.iter().enumerate() {
            let device = match StatefulDevice::from_config(entry) {
                Ok(device) => Arc::new(device),
                Err(e) => {
                    tracing::warn!(position, label = %entry.label, error = %e, "Rejecting device configuration");
                    continue;
                }
            };

            if registry.register(device.clone()).is_ok() {
                handles.push(device);
            }
        }

        tracing::info!(
            configured = config.devices.len(),
            registered = registry.len(),
            "Device registry built"
        );
        (registry, handles)
    }

    /// Registers a device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if a device with the same identifier is
    /// already registered. The original registration is kept.
    pub fn register(&mut self, handle: Arc<dyn DeviceHandle>) -> Result<()> {
        let id = handle.id().clone();
        if self.index.contains_key(&id) {
            tracing::warn!(device_id = %id, "Rejecting duplicate device registration");
            return Err(Error::DuplicateId(id));
        }

        tracing::debug!(device_id = %id, label = handle.label(), "Registered device");
        self.index.insert(id, self.devices.len());
        self.devices.push(handle);
        Ok(())
    }

    /// Looks up a device by identifier.
    ///
    /// Surrounding whitespace is ignored, as it is when a [`DeviceId`] is
    /// created.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&Arc<dyn DeviceHandle>> {
        self.index.get(id.trim()).map(|&i| &self.devices[i])
    }

    /// Looks up a device that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no device has this identifier.
    pub fn get(&self, id: &str) -> Result<&Arc<dyn DeviceHandle>> {
        self.lookup(id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    /// Returns `true` if a device with this identifier is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id.trim())
    }

    /// Returns all devices in registration order.
    #[must_use]
    pub fn all(&self) -> &[Arc<dyn DeviceHandle>] {
        &self.devices
    }

    /// Returns all identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.iter().map(|d| d.id())
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` if no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Capabilities;
    use crate::config::DeviceConfig;

    fn device(id: &str, label: &str) -> Arc<StatefulDevice> {
        Arc::new(StatefulDevice::new(
            DeviceId::new(id).unwrap(),
            label,
            Capabilities::basic(),
        ))
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.lookup("anything").is_none());
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = DeviceRegistry::new();
        registry.register(device("cam-1", "Camera 1")).unwrap();

        let handle = registry.lookup("cam-1").unwrap();
        assert_eq!(handle.label(), "Camera 1");
        assert!(registry.contains("cam-1"));
        assert!(!registry.contains("cam-2"));
        assert!(registry.get("cam-1").is_ok());
        assert!(matches!(registry.get("cam-2"), Err(Error::DeviceNotFound(ref id)) if id == "cam-2"));
    }

    #[test]
    fn lookup_ignores_surrounding_whitespace() {
        let mut registry = DeviceRegistry::new();
        registry.register(device(" cam-1 ", "Camera 1")).unwrap();

        assert_eq!(registry.lookup(" cam-1 ").unwrap().id().as_str(), "cam-1");
        assert!(registry.lookup("cam-1\t").is_some());
        assert!(registry.contains("  cam-1"));
        assert!(registry.get(" cam-1").is_ok());
        assert!(registry.lookup("   ").is_none());
    }

    #[test]
    fn duplicate_keeps_original() {
        let mut registry = DeviceRegistry::new();
        registry.register(device("cam-1", "Original")).unwrap();

        let err = registry.register(device("cam-1", "Impostor")).unwrap_err();
        assert!(matches!(err, Error::DuplicateId(ref id) if id.as_str() == "cam-1"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("cam-1").unwrap().label(), "Original");
    }

    #[test]
    fn all_preserves_registration_order() {
        let mut registry = DeviceRegistry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry.register(device(id, id)).unwrap();
        }

        let ids: Vec<&str> = registry.ids().map(DeviceId::as_str).collect();
        assert_eq!(ids, ["zeta", "alpha", "mid"]);

        let labels: Vec<&str> = registry.all().iter().map(|d| d.label()).collect();
        assert_eq!(labels, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn from_config_skips_bad_entries() {
        let config = RoomConfig {
            devices: vec![
                DeviceConfig::new("display-1", "Display 1"),
                DeviceConfig::new("", "No Id"),
                DeviceConfig::new("display-1", "Duplicate"),
                DeviceConfig::new("lift", "Screen Lift")
                    .with_capabilities(Capabilities::relay_bank(2)),
            ],
            ..RoomConfig::default()
        };

        let (registry, handles) = DeviceRegistry::from_config(&config);

        assert_eq!(registry.len(), 2);
        assert_eq!(handles.len(), 2);
        assert_eq!(registry.lookup("display-1").unwrap().label(), "Display 1");
        assert_eq!(handles[1].label(), "Screen Lift");
        assert!(handles[1].relay().is_some());
    }

    #[test]
    fn debug_lists_ids() {
        let mut registry = DeviceRegistry::new();
        registry.register(device("a", "A")).unwrap();
        assert_eq!(format!("{registry:?}"), "[DeviceId(a)]");
    }
}
