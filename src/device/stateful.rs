// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration-backed device handle.

use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use crate::Capabilities;
use crate::config::DeviceConfig;
use crate::error::{Error, Result, ValueError};
use crate::state::{DeviceChange, DeviceState};
use crate::subscription::{
    CallbackRegistry, ConnectivityHandler, InputHandler, PowerHandler, RelayHandler,
    SubscriptionId,
};
use crate::types::{DeviceId, InputIndex, PowerState, RelayIndex};

use super::{DeviceCommand, DeviceHandle, InputControl, PowerControl, RelayControl};

/// Device handle whose state is pushed in by a driver.
///
/// The handle owns the last known [`DeviceState`] and a [`CallbackRegistry`].
/// A driver, running on whatever thread or task its I/O needs, reports what it
/// observes through [`set_online`](Self::set_online),
/// [`update_relay`](Self::update_relay), [`update_power`](Self::update_power)
/// and [`update_input`](Self::update_input). Subscribers are only notified when
/// a report actually changes the state.
///
/// Commands issued through the capability interfaces are validated here and
/// forwarded to the driver over the channel returned by
/// [`attach_driver`](Self::attach_driver).
///
/// # Examples
///
/// ```
/// use roomlink::Capabilities;
/// use roomlink::device::{DeviceCommand, DeviceHandle, PowerControl, StatefulDevice};
/// use roomlink::types::{DeviceId, PowerState};
///
/// let device = StatefulDevice::new(
///     DeviceId::new("display-1").unwrap(),
///     "Display 1",
///     Capabilities::display(2),
/// );
/// let mut commands = device.attach_driver();
///
/// device.set_online(true);
/// device.power().unwrap().set_power(PowerState::On).unwrap();
///
/// assert_eq!(commands.try_recv().unwrap(), DeviceCommand::SetPower(PowerState::On));
/// ```
pub struct StatefulDevice {
    id: DeviceId,
    label: String,
    capabilities: Capabilities,
    state: RwLock<DeviceState>,
    callbacks: CallbackRegistry,
    notify: Mutex<()>,
    driver: Mutex<Option<mpsc::UnboundedSender<DeviceCommand>>>,
}

impl StatefulDevice {
    /// Creates an offline device handle.
    ///
    /// An empty label falls back to the device identifier.
    #[must_use]
    pub fn new(id: DeviceId, label: impl Into<String>, capabilities: Capabilities) -> Self {
        let label: String = label.into();
        let label = match label.trim() {
            "" => id.to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            id,
            label,
            capabilities: capabilities.normalized(),
            state: RwLock::new(DeviceState::new()),
            callbacks: CallbackRegistry::new(),
            notify: Mutex::new(()),
            driver: Mutex::new(None),
        }
    }

    /// Creates a device handle from a configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyDeviceId`] if the entry has no identifier.
    pub fn from_config(config: &DeviceConfig) -> Result<Self> {
        let id = DeviceId::new(&config.id)?;
        Ok(Self::new(id, config.label.as_str(), config.capabilities))
    }

    /// Returns the configured capabilities.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        *self.state.read()
    }

    // =========================================================================
    // Driver side
    // =========================================================================

    /// Attaches a driver and returns the receiving end of its command channel.
    ///
    /// Any previously attached driver is detached; its receiver will yield
    /// `None` once drained.
    pub fn attach_driver(&self) -> mpsc::UnboundedReceiver<DeviceCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.driver.lock().replace(tx).is_some() {
            tracing::debug!(device_id = %self.id, "Replacing attached driver");
        }
        rx
    }

    /// Detaches the current driver, if any.
    pub fn detach_driver(&self) {
        self.driver.lock().take();
    }

    /// Records the device's connectivity.
    ///
    /// Returns `true` if the flag changed, in which case connectivity
    /// subscribers have been notified.
    pub fn set_online(&self, online: bool) -> bool {
        self.apply(DeviceChange::Connectivity(online))
    }

    /// Records the active relay reported by the device.
    ///
    /// Reports for devices without relay control, or for relays beyond the
    /// configured count, are logged and ignored.
    pub fn update_relay(&self, index: RelayIndex) -> bool {
        if index.value() > self.capabilities.relays {
            tracing::warn!(
                device_id = %self.id,
                relay = index.value(),
                relays = self.capabilities.relays,
                "Ignoring relay report outside configured range"
            );
            return false;
        }
        self.apply(DeviceChange::Relay(index))
    }

    /// Records the power state reported by the device.
    pub fn update_power(&self, state: PowerState) -> bool {
        if !self.capabilities.supports_power() {
            tracing::warn!(device_id = %self.id, "Ignoring power report from device without power control");
            return false;
        }
        self.apply(DeviceChange::Power(state))
    }

    /// Records the selected input reported by the device.
    pub fn update_input(&self, input: InputIndex) -> bool {
        if input.value() > self.capabilities.inputs {
            tracing::warn!(
                device_id = %self.id,
                input = input.value(),
                inputs = self.capabilities.inputs,
                "Ignoring input report outside configured range"
            );
            return false;
        }
        self.apply(DeviceChange::Input(input))
    }

    /// Applies a change and notifies subscribers if it changed anything.
    ///
    /// Changes are applied and dispatched one at a time, so subscribers see
    /// them in the order they hit the state. The state lock itself is
    /// released before dispatch: subscribers may query the device, but must
    /// not report new state for it from inside a callback.
    fn apply(&self, change: DeviceChange) -> bool {
        let _order = self.notify.lock();
        let changed = self.state.write().apply(&change);
        if changed {
            tracing::trace!(device_id = %self.id, ?change, "Device state changed");
            self.callbacks.dispatch(&change);
        }
        changed
    }

    // =========================================================================
    // Command side
    // =========================================================================

    fn send(&self, command: DeviceCommand) -> Result<()> {
        if !self.is_online() {
            return Err(Error::NotConnected);
        }

        let driver = self.driver.lock();
        let tx = driver
            .as_ref()
            .ok_or_else(|| Error::DriverDetached(self.id.clone()))?;
        tx.send(command)
            .map_err(|_| Error::DriverDetached(self.id.clone()))?;

        tracing::debug!(device_id = %self.id, command = command.name(), "Command forwarded to driver");
        Ok(())
    }
}

fn check_range(value: u8, max: u8) -> Result<()> {
    if value > max {
        return Err(ValueError::OutOfRange {
            min: 1,
            max,
            actual: value,
        }
        .into());
    }
    Ok(())
}

impl DeviceHandle for StatefulDevice {
    fn id(&self) -> &DeviceId {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_online(&self) -> bool {
        self.state.read().is_online()
    }

    fn has_been_online(&self) -> bool {
        self.state.read().has_been_online()
    }

    fn on_connectivity_changed(&self, handler: ConnectivityHandler) -> SubscriptionId {
        self.callbacks.on_connectivity_changed(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }

    fn relay(&self) -> Option<&dyn RelayControl> {
        self.capabilities
            .supports_relays()
            .then_some(self as &dyn RelayControl)
    }

    fn power(&self) -> Option<&dyn PowerControl> {
        self.capabilities
            .supports_power()
            .then_some(self as &dyn PowerControl)
    }

    fn input(&self) -> Option<&dyn InputControl> {
        self.capabilities
            .supports_inputs()
            .then_some(self as &dyn InputControl)
    }
}

impl RelayControl for StatefulDevice {
    fn relay_count(&self) -> u8 {
        self.capabilities.relays
    }

    fn active_relay(&self) -> Option<RelayIndex> {
        self.state.read().relay()
    }

    fn pulse_relay(&self, index: RelayIndex, duration: Duration) -> Result<()> {
        check_range(index.value(), self.capabilities.relays)?;
        self.send(DeviceCommand::PulseRelay { index, duration })
    }

    fn on_relay_changed(&self, handler: RelayHandler) -> SubscriptionId {
        self.callbacks.on_relay_changed(handler)
    }
}

impl PowerControl for StatefulDevice {
    fn power_state(&self) -> Option<PowerState> {
        self.state.read().power()
    }

    fn set_power(&self, state: PowerState) -> Result<()> {
        self.send(DeviceCommand::SetPower(state))
    }

    fn on_power_changed(&self, handler: PowerHandler) -> SubscriptionId {
        self.callbacks.on_power_changed(handler)
    }
}

impl InputControl for StatefulDevice {
    fn input_count(&self) -> u8 {
        self.capabilities.inputs
    }

    fn active_input(&self) -> Option<InputIndex> {
        self.state.read().input()
    }

    fn select_input(&self, input: InputIndex) -> Result<()> {
        check_range(input.value(), self.capabilities.inputs)?;
        self.send(DeviceCommand::SelectInput(input))
    }

    fn on_input_changed(&self, handler: InputHandler) -> SubscriptionId {
        self.callbacks.on_input_changed(handler)
    }
}

impl std::fmt::Debug for StatefulDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatefulDevice")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("capabilities", &self.capabilities)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, mpsc as std_mpsc};
    use std::thread;

    fn display() -> StatefulDevice {
        StatefulDevice::new(
            DeviceId::new("display-1").unwrap(),
            "Display 1",
            Capabilities::display(4),
        )
    }

    #[test]
    fn new_device_is_offline() {
        let device = display();
        assert!(!device.is_online());
        assert_eq!(device.label(), "Display 1");
        assert_eq!(device.snapshot(), DeviceState::new());
    }

    #[test]
    fn empty_label_falls_back_to_id() {
        let device = StatefulDevice::new(
            DeviceId::new("cam-2").unwrap(),
            "  ",
            Capabilities::basic(),
        );
        assert_eq!(device.label(), "cam-2");
    }

    #[test]
    fn from_config_rejects_missing_id() {
        let config = DeviceConfig {
            id: String::new(),
            label: "Nameless".to_string(),
            capabilities: Capabilities::basic(),
        };
        let err = StatefulDevice::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::EmptyDeviceId)));
    }

    #[test]
    fn capability_interfaces_follow_configuration() {
        let device = display();
        assert!(device.power().is_some());
        assert!(device.input().is_some());
        assert!(device.relay().is_none());

        let relays = StatefulDevice::new(
            DeviceId::new("lift").unwrap(),
            "Screen Lift",
            Capabilities::relay_bank(2),
        );
        assert_eq!(relays.relay().map(|r| r.relay_count()), Some(2));
        assert!(relays.power().is_none());
    }

    #[test]
    fn set_online_notifies_only_on_change() {
        let device = display();
        let hits = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hits);
        device.on_connectivity_changed(Box::new(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(device.set_online(true));
        assert!(!device.set_online(true));
        assert!(device.set_online(false));

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn overlapping_reports_reach_subscribers_in_state_order() {
        let device = Arc::new(display());
        device.set_online(true);

        // The first subscriber stalls on the offline edge, holding up dispatch
        // while a second report arrives from another thread.
        let (stalled_tx, stalled_rx) = std_mpsc::channel();
        device.on_connectivity_changed(Box::new(move |online| {
            if !online {
                let _ = stalled_tx.send(());
                thread::sleep(Duration::from_millis(100));
            }
        }));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        device.on_connectivity_changed(Box::new(move |online| s.lock().push(online)));

        let dropper = {
            let device = Arc::clone(&device);
            thread::spawn(move || device.set_online(false))
        };
        stalled_rx.recv().unwrap();
        assert!(device.set_online(true));
        assert!(dropper.join().unwrap());

        let seen = seen.lock();
        assert_eq!(*seen, [false, true]);
        assert_eq!(seen.last().copied(), Some(device.is_online()));
    }

    #[test]
    fn out_of_range_reports_are_ignored() {
        let relays = StatefulDevice::new(
            DeviceId::new("lift").unwrap(),
            "Screen Lift",
            Capabilities::relay_bank(2),
        );
        assert!(relays.update_relay(RelayIndex::new(2).unwrap()));
        assert!(!relays.update_relay(RelayIndex::new(3).unwrap()));
        assert!(!relays.update_power(PowerState::On));
        assert_eq!(relays.active_relay(), RelayIndex::new(2).ok());
    }

    #[test]
    fn commands_require_online_device() {
        let device = display();
        let _rx = device.attach_driver();

        let err = device.set_power(PowerState::On).unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[test]
    fn commands_require_driver() {
        let device = display();
        device.set_online(true);

        let err = device.set_power(PowerState::On).unwrap_err();
        assert!(matches!(err, Error::DriverDetached(_)));

        let rx = device.attach_driver();
        drop(rx);
        let err = device.set_power(PowerState::Off).unwrap_err();
        assert!(matches!(err, Error::DriverDetached(_)));
    }

    #[test]
    fn commands_are_forwarded_to_driver() {
        let device = display();
        let mut rx = device.attach_driver();
        device.set_online(true);

        device.select_input(InputIndex::new(3).unwrap()).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            DeviceCommand::SelectInput(InputIndex::new(3).unwrap())
        );

        let err = device.select_input(InputIndex::new(9).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::OutOfRange { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn attaching_a_new_driver_detaches_the_old_one() {
        let device = display();
        device.set_online(true);
        let mut old = device.attach_driver();
        let mut new = device.attach_driver();

        device.set_power(PowerState::On).unwrap();
        assert!(new.try_recv().is_ok());
        assert!(matches!(
            old.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        device.detach_driver();
        assert!(device.set_power(PowerState::Off).is_err());
    }

    #[test]
    fn unsubscribe_covers_capability_streams() {
        let device = display();
        let id = device.on_power_changed(Box::new(|_| {}));
        assert!(DeviceHandle::unsubscribe(&device, id));
        assert!(!DeviceHandle::unsubscribe(&device, id));
    }
}
