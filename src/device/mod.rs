// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device handles and their optional control interfaces.
//!
//! Every controllable unit is represented by a [`DeviceHandle`]: an identifier,
//! a label, an online flag and a connectivity notification stream. What else a
//! device can do is expressed as optional capability interfaces queried at
//! wiring time rather than through a type hierarchy:
//!
//! - [`RelayControl`] - discrete relays (screen lifts, shades, door strikes)
//! - [`PowerControl`] - power on/off (displays, projectors, amplifiers)
//! - [`InputControl`] - source selection (displays, switchers)
//!
//! A handle that does not support a capability simply returns `None` from the
//! corresponding accessor, and nothing subscribes to that stream.
//!
//! [`StatefulDevice`] is the reference implementation built from
//! configuration. Drivers push observed state into it and receive
//! [`DeviceCommand`]s from it.

mod command;
mod stateful;

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::subscription::{
    ConnectivityHandler, InputHandler, PowerHandler, RelayHandler, SubscriptionId,
};
use crate::types::{DeviceId, InputIndex, PowerState, RelayIndex};

pub use command::DeviceCommand;
pub use stateful::StatefulDevice;

/// A controllable unit held by the [`DeviceRegistry`](crate::DeviceRegistry).
///
/// The trait is object safe; the registry stores `Arc<dyn DeviceHandle>`.
/// Notifications may be raised from any thread.
pub trait DeviceHandle: Send + Sync + fmt::Debug {
    /// Returns the unique identifier of the device.
    fn id(&self) -> &DeviceId;

    /// Returns the human-readable label.
    fn label(&self) -> &str;

    /// Returns whether the device is currently online.
    fn is_online(&self) -> bool;

    /// Returns whether the device has been online since it was created.
    ///
    /// Handles that keep no history answer with their current connectivity.
    fn has_been_online(&self) -> bool {
        self.is_online()
    }

    /// Subscribes to connectivity changes.
    fn on_connectivity_changed(&self, handler: ConnectivityHandler) -> SubscriptionId;

    /// Removes any subscription made on this device or its capability
    /// interfaces.
    ///
    /// Returns `true` if a subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Returns the relay interface if the device supports it.
    fn relay(&self) -> Option<&dyn RelayControl> {
        None
    }

    /// Returns the power interface if the device supports it.
    fn power(&self) -> Option<&dyn PowerControl> {
        None
    }

    /// Returns the input selection interface if the device supports it.
    fn input(&self) -> Option<&dyn InputControl> {
        None
    }
}

/// Discrete relay control.
pub trait RelayControl: Send + Sync {
    /// Number of relays on the device.
    fn relay_count(&self) -> u8;

    /// Last relay the device reported as active.
    fn active_relay(&self) -> Option<RelayIndex>;

    /// Closes a relay for `duration`, then opens it again.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range for this device, the
    /// device is offline, or no driver is attached.
    fn pulse_relay(&self, index: RelayIndex, duration: Duration) -> Result<()>;

    /// Subscribes to relay changes.
    fn on_relay_changed(&self, handler: RelayHandler) -> SubscriptionId;
}

/// Power on/off control.
pub trait PowerControl: Send + Sync {
    /// Last power state the device reported.
    fn power_state(&self) -> Option<PowerState>;

    /// Requests a power state.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is offline or no driver is attached.
    fn set_power(&self, state: PowerState) -> Result<()>;

    /// Subscribes to power state changes.
    fn on_power_changed(&self, handler: PowerHandler) -> SubscriptionId;
}

/// Source input selection.
pub trait InputControl: Send + Sync {
    /// Number of selectable inputs.
    fn input_count(&self) -> u8;

    /// Last input the device reported as selected.
    fn active_input(&self) -> Option<InputIndex>;

    /// Requests an input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is out of range for this device, the
    /// device is offline, or no driver is attached.
    fn select_input(&self, input: InputIndex) -> Result<()>;

    /// Subscribes to input changes.
    fn on_input_changed(&self, handler: InputHandler) -> SubscriptionId;
}
