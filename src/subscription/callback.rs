// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for device notifications.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Registry for storing and dispatching callbacks

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::DeviceChange;
use crate::types::{InputIndex, PowerState, RelayIndex};

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Issues [`SubscriptionId`]s, starting at 1.
#[derive(Debug)]
pub(crate) struct IdSequence(AtomicU64);

impl IdSequence {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(crate) fn next(&self) -> SubscriptionId {
        SubscriptionId::new(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Boxed connectivity callback, receives the new online flag.
pub type ConnectivityHandler = Box<dyn Fn(bool) + Send + Sync>;

/// Boxed relay callback, receives the newly active relay.
pub type RelayHandler = Box<dyn Fn(RelayIndex) + Send + Sync>;

/// Boxed power callback, receives the new power state.
pub type PowerHandler = Box<dyn Fn(PowerState) + Send + Sync>;

/// Boxed input callback, receives the newly selected input.
pub type InputHandler = Box<dyn Fn(InputIndex) + Send + Sync>;

type Callbacks<T> = RwLock<BTreeMap<SubscriptionId, Arc<T>>>;

/// Registry for managing device notification callbacks.
///
/// Device handles embed one registry and route every observed
/// [`DeviceChange`] through [`dispatch`](Self::dispatch). Callbacks are held
/// in ordered maps, so subscribers are notified in subscription order.
///
/// # Thread Safety
///
/// The registry is fully thread-safe and can be dispatched from a driver's
/// I/O thread while other threads subscribe or unsubscribe. Dispatch works on
/// a snapshot of the callbacks, so a callback may unsubscribe itself.
pub struct CallbackRegistry {
    ids: IdSequence,
    connectivity_callbacks: Callbacks<dyn Fn(bool) + Send + Sync>,
    relay_callbacks: Callbacks<dyn Fn(RelayIndex) + Send + Sync>,
    power_callbacks: Callbacks<dyn Fn(PowerState) + Send + Sync>,
    input_callbacks: Callbacks<dyn Fn(InputIndex) + Send + Sync>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: IdSequence::new(),
            connectivity_callbacks: RwLock::new(BTreeMap::new()),
            relay_callbacks: RwLock::new(BTreeMap::new()),
            power_callbacks: RwLock::new(BTreeMap::new()),
            input_callbacks: RwLock::new(BTreeMap::new()),
        }
    }

    // =========================================================================
    // Registration methods
    // =========================================================================

    /// Registers a callback for connectivity changes.
    pub fn on_connectivity_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.ids.next();
        self.connectivity_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for relay changes.
    pub fn on_relay_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(RelayIndex) + Send + Sync + 'static,
    {
        let id = self.ids.next();
        self.relay_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for power state changes.
    pub fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static,
    {
        let id = self.ids.next();
        self.power_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for input changes.
    pub fn on_input_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(InputIndex) + Send + Sync + 'static,
    {
        let id = self.ids.next();
        self.input_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    // =========================================================================
    // Unsubscription
    // =========================================================================

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.connectivity_callbacks.write().remove(&id).is_some()
            || self.relay_callbacks.write().remove(&id).is_some()
            || self.power_callbacks.write().remove(&id).is_some()
            || self.input_callbacks.write().remove(&id).is_some()
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.connectivity_callbacks.write().clear();
        self.relay_callbacks.write().clear();
        self.power_callbacks.write().clear();
        self.input_callbacks.write().clear();
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Dispatches a change to the callbacks registered for its kind.
    ///
    /// Callbacks are called synchronously, in subscription order, on the
    /// calling thread.
    pub fn dispatch(&self, change: &DeviceChange) {
        match *change {
            DeviceChange::Connectivity(online) => {
                for callback in snapshot(&self.connectivity_callbacks) {
                    callback(online);
                }
            }
            DeviceChange::Relay(index) => {
                for callback in snapshot(&self.relay_callbacks) {
                    callback(index);
                }
            }
            DeviceChange::Power(state) => {
                for callback in snapshot(&self.power_callbacks) {
                    callback(state);
                }
            }
            DeviceChange::Input(input) => {
                for callback in snapshot(&self.input_callbacks) {
                    callback(input);
                }
            }
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.connectivity_callbacks.read().len()
            + self.relay_callbacks.read().len()
            + self.power_callbacks.read().len()
            + self.input_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

fn snapshot<T: ?Sized>(callbacks: &Callbacks<T>) -> Vec<Arc<T>> {
    callbacks.read().values().cloned().collect()
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}
