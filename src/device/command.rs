// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use crate::types::{InputIndex, PowerState, RelayIndex};

/// A validated command forwarded from a device handle to its driver.
///
/// Drivers receive these from
/// [`StatefulDevice::attach_driver`](super::StatefulDevice::attach_driver)
/// and translate them into the device's wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Close a relay for the given duration.
    PulseRelay {
        /// The relay to pulse.
        index: RelayIndex,
        /// How long the relay stays closed.
        duration: Duration,
    },

    /// Switch power on or off.
    SetPower(PowerState),

    /// Route a source input.
    SelectInput(InputIndex),
}

impl DeviceCommand {
    /// Returns a short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PulseRelay { .. } => "pulse_relay",
            Self::SetPower(_) => "set_power",
            Self::SelectInput(_) => "select_input",
        }
    }
}
