// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `roomlink` - device event aggregation and offline notifications for
//! room control systems.
//!
//! A room is a fixed set of devices (displays, relay controllers, switchers,
//! cameras) described by configuration. This library keeps track of them and
//! turns what their drivers report into something applications can consume:
//!
//! - **Device registry**: devices keyed by identifier, in configuration order
//! - **Event aggregation**: one ordered stream of application events for the
//!   whole room, plus query and command passthroughs keyed by identifier
//! - **Offline notifications**: a deduplicated FIFO of "device offline"
//!   notices, shown one at a time on a single-slot status display
//!
//! # Device Capabilities
//!
//! Every device has an online flag. Beyond that, a device may offer:
//!
//! - Relay control (pulse a relay, report the active relay)
//! - Power control (on/off)
//! - Input selection
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use roomlink::config::RoomConfig;
//! use roomlink::event::EventAggregator;
//! use roomlink::notify::{ErrorNotificationManager, WatchChannel};
//! use roomlink::DeviceRegistry;
//!
//! let config = RoomConfig::from_json_str(r#"{
//!     "devices": [
//!         { "id": "display-1", "label": "Display 1",
//!           "capabilities": { "power": true, "inputs": 2 } },
//!         { "id": "lift", "label": "Screen Lift",
//!           "capabilities": { "relays": 2 } }
//!     ]
//! }"#).unwrap();
//!
//! let (registry, devices) = DeviceRegistry::from_config(&config);
//! let aggregator = EventAggregator::new(Arc::new(registry));
//!
//! let display = Arc::new(WatchChannel::new());
//! let notifier = Arc::new(ErrorNotificationManager::new(
//!     display.clone(),
//!     config.notifications.clone(),
//! ));
//! notifier.attach(&aggregator);
//!
//! // A driver reports the display coming up and dropping off again.
//! devices[0].set_online(true);
//! devices[0].set_online(false);
//! assert_eq!(display.current().to_wire(), "3:Display 1 offline");
//!
//! devices[0].set_online(true);
//! assert_eq!(display.current().to_wire(), "0:");
//! ```
//!
//! # Drivers
//!
//! Drivers own the I/O with the physical device. They push what they observe
//! into a [`StatefulDevice`](device::StatefulDevice) from any thread, and
//! receive the commands issued through the aggregator over the channel
//! returned by [`attach_driver`](device::StatefulDevice::attach_driver).

mod capabilities;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod notify;
mod registry;
pub mod state;
pub mod subscription;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder};
pub use device::{DeviceHandle, InputControl, PowerControl, RelayControl};
pub use error::{Error, Result, ValueError};
pub use event::{AppEvent, EventAggregator};
pub use notify::{ErrorNotificationManager, Severity, StatusChannel, StatusMessage};
pub use registry::DeviceRegistry;
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use types::{DeviceId, InputIndex, PowerState, RelayIndex};
