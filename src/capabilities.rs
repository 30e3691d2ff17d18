// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device capability sets.
//!
//! A capability set describes which optional control interfaces a configured
//! device offers on top of connectivity, which every device has. It is read
//! from configuration and decides which of
//! [`RelayControl`](crate::device::RelayControl),
//! [`PowerControl`](crate::device::PowerControl) and
//! [`InputControl`](crate::device::InputControl) a
//! [`StatefulDevice`](crate::device::StatefulDevice) exposes.

use serde::{Deserialize, Serialize};

use crate::types::{InputIndex, RelayIndex};

/// Capabilities of a controllable device.
///
/// # Examples
///
/// ```
/// use roomlink::Capabilities;
///
/// // Connectivity only (e.g. a touch panel or a network camera)
/// let basic = Capabilities::default();
/// assert!(!basic.supports_relays());
///
/// // Flat panel display with power and four inputs
/// let display = Capabilities::display(4);
/// assert!(display.supports_power());
/// assert_eq!(display.inputs, 4);
///
/// // Eight-channel relay bank
/// let relays = Capabilities::relay_bank(8);
/// assert_eq!(relays.relays, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Number of discrete relays (0 = no relay control, max 16).
    pub relays: u8,

    /// Supports power on/off control.
    pub power: bool,

    /// Number of selectable source inputs (0 = no input selection, max 64).
    pub inputs: u8,
}

impl Capabilities {
    /// Creates capabilities for a connectivity-only device.
    #[must_use]
    pub const fn basic() -> Self {
        Self {
            relays: 0,
            power: false,
            inputs: 0,
        }
    }

    /// Creates capabilities for a display or projector.
    ///
    /// - Power control
    /// - `inputs` selectable sources (clamped to 64)
    #[must_use]
    pub fn display(inputs: u8) -> Self {
        Self {
            relays: 0,
            power: true,
            inputs: inputs.min(InputIndex::MAX),
        }
    }

    /// Creates capabilities for a relay controller with `relays` outputs
    /// (clamped to 16).
    #[must_use]
    pub fn relay_bank(relays: u8) -> Self {
        Self {
            relays: relays.min(RelayIndex::MAX),
            power: false,
            inputs: 0,
        }
    }

    /// Creates capabilities for a matrix or presentation switcher.
    #[must_use]
    pub fn switcher(inputs: u8) -> Self {
        Self {
            relays: 0,
            power: false,
            inputs: inputs.min(InputIndex::MAX),
        }
    }

    /// Returns whether this device exposes relay control.
    #[must_use]
    pub const fn supports_relays(&self) -> bool {
        self.relays > 0
    }

    /// Returns whether this device exposes power control.
    #[must_use]
    pub const fn supports_power(&self) -> bool {
        self.power
    }

    /// Returns whether this device exposes input selection.
    #[must_use]
    pub const fn supports_inputs(&self) -> bool {
        self.inputs > 0
    }

    /// Returns the capabilities with relay and input counts clamped to
    /// their valid maximums.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            relays: self.relays.min(RelayIndex::MAX),
            power: self.power,
            inputs: self.inputs.min(InputIndex::MAX),
        }
    }
}

/// Builder for creating custom capabilities.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Creates a new builder with connectivity-only capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of relays.
    #[must_use]
    pub fn relays(mut self, count: u8) -> Self {
        self.inner.relays = count.min(RelayIndex::MAX);
        self
    }

    /// Enables power control.
    #[must_use]
    pub fn with_power(mut self) -> Self {
        self.inner.power = true;
        self
    }

    /// Sets the number of selectable inputs.
    #[must_use]
    pub fn inputs(mut self, count: u8) -> Self {
        self.inner.inputs = count.min(InputIndex::MAX);
        self
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}
