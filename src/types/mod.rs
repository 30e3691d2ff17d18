// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so a caller-supplied value is validated once at the boundary.
//!
//! # Types
//!
//! - [`DeviceId`] - Non-empty identifier of a configured device
//! - [`PowerState`] - On/Off state of switchable equipment
//! - [`RelayIndex`] - Relay index on a relay controller (1-16)
//! - [`InputIndex`] - Selected source input (1-64)

mod device_id;
mod input;
mod power;
mod relay;

pub use device_id::DeviceId;
pub use input::InputIndex;
pub use power::PowerState;
pub use relay::RelayIndex;
