// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan-in of device notifications into application events.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::device::DeviceHandle;
use crate::error::{Error, Result};
use crate::registry::DeviceRegistry;
use crate::state::DeviceChange;
use crate::subscription::{IdSequence, SubscriptionId};
use crate::types::{DeviceId, InputIndex, PowerState, RelayIndex};

use super::{AppEvent, EventBus};

type EventHandler = Arc<dyn Fn(&AppEvent) + Send + Sync>;

/// Serialized publication point shared by every device subscription.
struct Publisher {
    /// Held for the whole translate-and-publish step.
    gate: Mutex<()>,
    ids: IdSequence,
    handlers: RwLock<BTreeMap<SubscriptionId, EventHandler>>,
    bus: EventBus,
}

impl Publisher {
    fn new(bus: EventBus) -> Self {
        Self {
            gate: Mutex::new(()),
            ids: IdSequence::new(),
            handlers: RwLock::new(BTreeMap::new()),
            bus,
        }
    }

    fn publish(&self, event: AppEvent) {
        let _gate = self.gate.lock();

        let handlers: Vec<(SubscriptionId, EventHandler)> = self
            .handlers
            .read()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        for (subscription, handler) in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::error!(
                    %subscription,
                    device_id = %event.device_id(),
                    "Application event handler panicked"
                );
            }
        }

        tracing::trace!(?event, "Publishing application event");
        self.bus.publish(event);
    }
}

/// Returns a closure that republishes changes of one device.
fn forwarder(
    publisher: &Arc<Publisher>,
    device_id: &DeviceId,
) -> impl Fn(DeviceChange) + Clone + Send + Sync + 'static {
    let publisher = Arc::clone(publisher);
    let device_id = device_id.clone();
    move |change| publisher.publish(AppEvent::from_change(device_id.clone(), change))
}

/// Subscribes to every notification stream the device offers.
fn wire(device: &dyn DeviceHandle, publisher: &Arc<Publisher>) -> Vec<SubscriptionId> {
    let forward = forwarder(publisher, device.id());
    let mut subscriptions = Vec::with_capacity(4);

    let f = forward.clone();
    subscriptions.push(
        device.on_connectivity_changed(Box::new(move |online| {
            f(DeviceChange::Connectivity(online));
        })),
    );

    if let Some(relay) = device.relay() {
        let f = forward.clone();
        subscriptions.push(relay.on_relay_changed(Box::new(move |index| {
            f(DeviceChange::Relay(index));
        })));
    }

    if let Some(power) = device.power() {
        let f = forward.clone();
        subscriptions.push(power.on_power_changed(Box::new(move |state| {
            f(DeviceChange::Power(state));
        })));
    }

    if let Some(input) = device.input() {
        subscriptions.push(input.on_input_changed(Box::new(move |index| {
            forward(DeviceChange::Input(index));
        })));
    }

    tracing::debug!(
        device_id = %device.id(),
        relay = device.relay().is_some(),
        power = device.power().is_some(),
        input = device.input().is_some(),
        "Wired device notifications"
    );
    subscriptions
}

/// Republishes device notifications as application events.
///
/// At construction the aggregator subscribes exactly once to every device in
/// the registry: to its connectivity stream, and to each capability stream
/// the device actually offers. Devices may raise notifications from any
/// thread; translation and publication run under a single lock per
/// aggregator, so every subscriber observes the same total order of events.
///
/// Each event is delivered first to the synchronous handlers registered with
/// [`on_event`](Self::on_event), then to the broadcast channel returned by
/// [`subscribe`](Self::subscribe). A panicking handler is logged and does not
/// prevent delivery to the others.
///
/// The aggregator also offers a query and command surface keyed by
/// caller-supplied identifiers. Unknown identifiers never fail the caller:
/// queries return `false`/`None` and commands return `false`, and a
/// diagnostic is logged.
///
/// Dropping the aggregator removes all of its device subscriptions.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use roomlink::{Capabilities, DeviceRegistry};
/// use roomlink::device::StatefulDevice;
/// use roomlink::event::{AppEvent, EventAggregator};
/// use roomlink::types::DeviceId;
///
/// let display = Arc::new(StatefulDevice::new(
///     DeviceId::new("display-1").unwrap(),
///     "Display 1",
///     Capabilities::display(2),
/// ));
/// let mut registry = DeviceRegistry::new();
/// registry.register(display.clone()).unwrap();
///
/// let aggregator = EventAggregator::new(Arc::new(registry));
/// let mut events = aggregator.subscribe();
///
/// display.set_online(true);
///
/// assert!(matches!(
///     events.try_recv().unwrap(),
///     AppEvent::ConnectivityChanged { online: true, .. }
/// ));
/// assert!(aggregator.is_device_online("display-1"));
/// assert!(!aggregator.is_device_online("no-such-device"));
/// ```
pub struct EventAggregator {
    registry: Arc<DeviceRegistry>,
    publisher: Arc<Publisher>,
    wiring: Vec<(Arc<dyn DeviceHandle>, SubscriptionId)>,
}

impl EventAggregator {
    /// Creates an aggregator wired to every device in the registry.
    #[must_use]
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self::with_bus(registry, EventBus::new())
    }

    /// Creates an aggregator with a custom broadcast capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(registry: Arc<DeviceRegistry>, capacity: usize) -> Self {
        Self::with_bus(registry, EventBus::with_capacity(capacity))
    }

    fn with_bus(registry: Arc<DeviceRegistry>, bus: EventBus) -> Self {
        let publisher = Arc::new(Publisher::new(bus));
        let mut wiring = Vec::new();

        for device in registry.all() {
            for subscription in wire(device.as_ref(), &publisher) {
                wiring.push((Arc::clone(device), subscription));
            }
        }

        tracing::info!(
            devices = registry.len(),
            subscriptions = wiring.len(),
            "Event aggregator wired"
        );

        Self {
            registry,
            publisher,
            wiring,
        }
    }

    /// Returns the registry this aggregator is wired to.
    #[must_use]
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to application events over a broadcast channel.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.publisher.bus.subscribe()
    }

    /// Registers a synchronous event handler.
    ///
    /// Handlers run on the thread that raised the device notification, inside
    /// the aggregator's publication lock, in registration order. They must not
    /// drive device state synchronously, since that would re-enter the lock.
    pub fn on_event<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = self.publisher.ids.next();
        self.publisher.handlers.write().insert(id, Arc::new(handler));
        id
    }

    /// Removes a handler registered with [`on_event`](Self::on_event).
    ///
    /// Returns `true` if a handler was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.publisher.handlers.write().remove(&id).is_some()
    }

    /// Returns the number of synchronous handlers plus broadcast receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.publisher.handlers.read().len() + self.publisher.bus.subscriber_count()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns whether the device is online; `false` for unknown devices.
    #[must_use]
    pub fn is_device_online(&self, id: &str) -> bool {
        self.resolve(id, "is_device_online")
            .is_some_and(|device| device.is_online())
    }

    /// Returns the device label, or `None` for unknown devices.
    #[must_use]
    pub fn device_label(&self, id: &str) -> Option<&str> {
        self.resolve(id, "device_label").map(|device| device.label())
    }

    /// Returns the active relay of a relay controller.
    #[must_use]
    pub fn active_relay(&self, id: &str) -> Option<RelayIndex> {
        self.resolve(id, "active_relay")?.relay()?.active_relay()
    }

    /// Returns the power state of a device with power control.
    #[must_use]
    pub fn power_state(&self, id: &str) -> Option<PowerState> {
        self.resolve(id, "power_state")?.power()?.power_state()
    }

    /// Returns the selected input of a device with input selection.
    #[must_use]
    pub fn active_input(&self, id: &str) -> Option<InputIndex> {
        self.resolve(id, "active_input")?.input()?.active_input()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Pulses a relay on a relay controller.
    ///
    /// Returns `true` if the command was forwarded to the device's driver.
    pub fn pulse_relay(&self, id: &str, index: RelayIndex, duration: Duration) -> bool {
        self.command(id, "pulse_relay", |device| {
            capability(device, device.relay(), "relay control")?.pulse_relay(index, duration)
        })
    }

    /// Requests a power state.
    ///
    /// Returns `true` if the command was forwarded to the device's driver.
    pub fn set_power(&self, id: &str, state: PowerState) -> bool {
        self.command(id, "set_power", |device| {
            capability(device, device.power(), "power control")?.set_power(state)
        })
    }

    /// Requests a source input.
    ///
    /// Returns `true` if the command was forwarded to the device's driver.
    pub fn select_input(&self, id: &str, input: InputIndex) -> bool {
        self.command(id, "select_input", |device| {
            capability(device, device.input(), "input selection")?.select_input(input)
        })
    }

    /// Runs a command against a caller-supplied identifier, logging failures.
    fn command<F>(&self, id: &str, operation: &'static str, f: F) -> bool
    where
        F: FnOnce(&dyn DeviceHandle) -> Result<()>,
    {
        let result = self.registry.get(id).and_then(|device| f(device.as_ref()));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(device_id = id, operation, error = %e, "Device command rejected");
                false
            }
        }
    }

    fn resolve(&self, id: &str, operation: &'static str) -> Option<&Arc<dyn DeviceHandle>> {
        let device = self.registry.lookup(id);
        if device.is_none() {
            tracing::debug!(device_id = id, operation, "Unknown device id");
        }
        device
    }
}

fn capability<'a, T: ?Sized>(
    device: &dyn DeviceHandle,
    control: Option<&'a T>,
    name: &'static str,
) -> Result<&'a T> {
    control.ok_or_else(|| Error::CapabilityNotSupported {
        device_id: device.id().clone(),
        capability: name,
    })
}

impl Drop for EventAggregator {
    fn drop(&mut self) {
        for (device, subscription) in self.wiring.drain(..) {
            device.unsubscribe(subscription);
        }
    }
}

impl std::fmt::Debug for EventAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventAggregator")
            .field("devices", &self.registry.len())
            .field("subscriptions", &self.wiring.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
