// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Application events.
//!
//! The [`EventAggregator`] subscribes to every registered device and
//! republishes what it hears as [`AppEvent`]s, tagged with the device
//! identifier. Consumers either register synchronous handlers with
//! [`EventAggregator::on_event`] or receive events over an [`EventBus`]
//! broadcast channel.
//!
//! # Examples
//!
//! ```
//! use roomlink::event::{AppEvent, EventBus};
//! use roomlink::types::DeviceId;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let device_id = DeviceId::new("display-1").unwrap();
//! bus.publish(AppEvent::ConnectivityChanged { device_id, online: true });
//!
//! assert!(rx.try_recv().unwrap().is_connectivity());
//! ```

mod aggregator;
mod app_event;
mod event_bus;

pub use aggregator::EventAggregator;
pub use app_event::AppEvent;
pub use event_bus::EventBus;
