// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use serde::{Deserialize, Serialize};

use crate::types::{InputIndex, PowerState, RelayIndex};

use super::DeviceChange;

/// Last known state of a device.
///
/// Devices start offline with every capability value unknown; values are
/// filled in as the driver reports them. The state also remembers whether the
/// device has ever been online.
///
/// # Examples
///
/// ```
/// use roomlink::state::{DeviceChange, DeviceState};
///
/// let mut state = DeviceState::new();
/// assert!(!state.is_online());
///
/// state.apply(&DeviceChange::Connectivity(true));
/// assert!(state.is_online());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    online: bool,
    #[serde(default)]
    seen_online: bool,
    relay: Option<RelayIndex>,
    power: Option<PowerState>,
    input: Option<InputIndex>,
}

impl DeviceState {
    /// Creates a new offline state with nothing known.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the device is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Returns whether the device has been online at any point.
    #[must_use]
    pub fn has_been_online(&self) -> bool {
        self.seen_online
    }

    /// Returns the last reported active relay.
    #[must_use]
    pub fn relay(&self) -> Option<RelayIndex> {
        self.relay
    }

    /// Returns the last reported power state.
    #[must_use]
    pub fn power(&self) -> Option<PowerState> {
        self.power
    }

    /// Returns the last reported input.
    #[must_use]
    pub fn input(&self) -> Option<InputIndex> {
        self.input
    }

    /// Applies a change to the state.
    ///
    /// Returns `true` if the state actually changed.
    pub fn apply(&mut self, change: &DeviceChange) -> bool {
        match *change {
            DeviceChange::Connectivity(online) => {
                self.seen_online |= online;
                replace(&mut self.online, online)
            }
            DeviceChange::Relay(index) => replace(&mut self.relay, Some(index)),
            DeviceChange::Power(state) => replace(&mut self.power, Some(state)),
            DeviceChange::Input(input) => replace(&mut self.input, Some(input)),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_offline_and_unknown() {
        let state = DeviceState::new();
        assert!(!state.is_online());
        assert!(state.relay().is_none());
        assert!(state.power().is_none());
        assert!(state.input().is_none());
    }

    #[test]
    fn apply_reports_real_changes_only() {
        let mut state = DeviceState::new();

        assert!(!state.apply(&DeviceChange::Connectivity(false)));
        assert!(state.apply(&DeviceChange::Connectivity(true)));
        assert!(!state.apply(&DeviceChange::Connectivity(true)));

        let relay = RelayIndex::new(2).unwrap();
        assert!(state.apply(&DeviceChange::Relay(relay)));
        assert!(!state.apply(&DeviceChange::Relay(relay)));
        assert_eq!(state.relay(), Some(relay));
    }

    #[test]
    fn apply_power_and_input() {
        let mut state = DeviceState::new();
        state.apply(&DeviceChange::Power(PowerState::On));
        state.apply(&DeviceChange::Input(InputIndex::new(3).unwrap()));

        assert_eq!(state.power(), Some(PowerState::On));
        assert_eq!(state.input().map(|i| i.value()), Some(3));

        assert!(state.apply(&DeviceChange::Power(PowerState::Off)));
        assert_eq!(state.power(), Some(PowerState::Off));
    }

    #[test]
    fn going_offline_keeps_last_known_values() {
        let mut state = DeviceState::new();
        state.apply(&DeviceChange::Connectivity(true));
        state.apply(&DeviceChange::Power(PowerState::On));
        state.apply(&DeviceChange::Connectivity(false));

        assert!(!state.is_online());
        assert_eq!(state.power(), Some(PowerState::On));
    }

    #[test]
    fn remembers_having_been_online() {
        let mut state = DeviceState::new();
        state.apply(&DeviceChange::Connectivity(false));
        assert!(!state.has_been_online());

        state.apply(&DeviceChange::Connectivity(true));
        state.apply(&DeviceChange::Connectivity(false));
        assert!(!state.is_online());
        assert!(state.has_been_online());
    }
}
