// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Low-level device change notifications.
//!
//! A [`DeviceChange`] is what a device driver observes on the wire: the device
//! went online or offline, a relay closed, the power state flipped, a different
//! source was selected. Changes are applied to a
//! [`DeviceState`](super::DeviceState) and dispatched to the device's
//! subscribers when they actually change something.
//!
//! # Examples
//!
//! ```
//! use roomlink::state::{DeviceChange, DeviceState};
//! use roomlink::types::PowerState;
//!
//! let mut state = DeviceState::new();
//!
//! // Apply returns true if state actually changed
//! assert!(state.apply(&DeviceChange::Power(PowerState::On)));
//!
//! // Applying same change again returns false
//! assert!(!state.apply(&DeviceChange::Power(PowerState::On)));
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{InputIndex, PowerState, RelayIndex};

/// Represents a change reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceChange {
    /// The device came online (`true`) or went offline (`false`).
    Connectivity(bool),

    /// The active relay changed.
    Relay(RelayIndex),

    /// Power state changed.
    Power(PowerState),

    /// Selected input changed.
    Input(InputIndex),
}

impl DeviceChange {
    /// Returns `true` if this is a connectivity change.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    /// Returns the capability this change belongs to, or `None` for
    /// connectivity which every device has.
    #[must_use]
    pub fn capability(&self) -> Option<&'static str> {
        match self {
            Self::Connectivity(_) => None,
            Self::Relay(_) => Some("relay control"),
            Self::Power(_) => Some("power control"),
            Self::Input(_) => Some("input selection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_connectivity() {
        assert!(DeviceChange::Connectivity(true).is_connectivity());
        assert!(!DeviceChange::Power(PowerState::On).is_connectivity());
    }

    #[test]
    fn capability_names() {
        assert_eq!(DeviceChange::Connectivity(false).capability(), None);
        assert_eq!(
            DeviceChange::Relay(RelayIndex::first()).capability(),
            Some("relay control")
        );
        assert_eq!(
            DeviceChange::Input(InputIndex::new(2).unwrap()).capability(),
            Some("input selection")
        );
    }
}
