// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state management types.
//!
//! The [`DeviceState`] struct holds the last known state of a device, while
//! [`DeviceChange`] represents individual changes reported by its driver.
//!
//! # Examples
//!
//! ```
//! use roomlink::state::{DeviceChange, DeviceState};
//! use roomlink::types::PowerState;
//!
//! let mut state = DeviceState::new();
//! state.apply(&DeviceChange::Power(PowerState::On));
//!
//! assert_eq!(state.power(), Some(PowerState::On));
//! ```

mod device_state;
mod state_change;

pub use device_state::DeviceState;
pub use state_change::DeviceChange;
