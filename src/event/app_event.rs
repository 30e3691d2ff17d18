// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application event types.

use serde::{Deserialize, Serialize};

use crate::state::DeviceChange;
use crate::types::{DeviceId, InputIndex, PowerState, RelayIndex};

/// Events published by the [`EventAggregator`](super::EventAggregator).
///
/// Every event carries the identifier of the device it came from, so UI and
/// orchestration consumers can correlate it back to configuration. Events are
/// plain values and can be cloned freely between subscribers.
///
/// # Examples
///
/// ```
/// use roomlink::event::AppEvent;
/// use roomlink::types::DeviceId;
///
/// let device_id = DeviceId::new("display-1").unwrap();
/// let event = AppEvent::ConnectivityChanged { device_id, online: false };
///
/// assert!(event.is_connectivity());
/// assert_eq!(event.device_id().as_str(), "display-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppEvent {
    /// A device came online or went offline.
    ConnectivityChanged {
        /// The device.
        device_id: DeviceId,
        /// Whether the device is now online.
        online: bool,
    },

    /// A relay controller reported a new active relay.
    RelayChanged {
        /// The device.
        device_id: DeviceId,
        /// The newly active relay.
        relay_index: RelayIndex,
    },

    /// A device reported a new power state.
    PowerChanged {
        /// The device.
        device_id: DeviceId,
        /// The new power state.
        state: PowerState,
    },

    /// A device reported a new selected input.
    InputChanged {
        /// The device.
        device_id: DeviceId,
        /// The newly selected input.
        input: InputIndex,
    },
}

impl AppEvent {
    /// Translates a low-level device change into an application event.
    #[must_use]
    pub fn from_change(device_id: DeviceId, change: DeviceChange) -> Self {
        match change {
            DeviceChange::Connectivity(online) => Self::ConnectivityChanged { device_id, online },
            DeviceChange::Relay(relay_index) => Self::RelayChanged {
                device_id,
                relay_index,
            },
            DeviceChange::Power(state) => Self::PowerChanged { device_id, state },
            DeviceChange::Input(input) => Self::InputChanged { device_id, input },
        }
    }

    /// Returns the device identifier associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::ConnectivityChanged { device_id, .. }
            | Self::RelayChanged { device_id, .. }
            | Self::PowerChanged { device_id, .. }
            | Self::InputChanged { device_id, .. } => device_id,
        }
    }

    /// Returns `true` if this is a connectivity event.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectivityChanged { .. })
    }
}
