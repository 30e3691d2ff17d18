// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for low-level device notifications.
//!
//! Device drivers raise notifications from their own I/O threads. Each
//! device handle keeps a [`CallbackRegistry`] and fans those notifications out
//! to whoever subscribed, which in practice is the
//! [`EventAggregator`](crate::event::EventAggregator).
//!
//! # Overview
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription, used to unsubscribe
//! - [`CallbackRegistry`] - Registry that stores callbacks and dispatches changes
//! - [`ConnectivityHandler`], [`RelayHandler`], [`PowerHandler`], [`InputHandler`] -
//!   boxed callback types accepted by the object-safe device traits
//!
//! # Usage
//!
//! ```
//! use roomlink::state::DeviceChange;
//! use roomlink::subscription::CallbackRegistry;
//!
//! let registry = CallbackRegistry::new();
//! let sub_id = registry.on_connectivity_changed(|online| {
//!     println!("device is now {}", if online { "online" } else { "offline" });
//! });
//!
//! registry.dispatch(&DeviceChange::Connectivity(true));
//! registry.unsubscribe(sub_id);
//! ```

mod callback;

pub(crate) use callback::IdSequence;
pub use callback::{
    CallbackRegistry, ConnectivityHandler, InputHandler, PowerHandler, RelayHandler,
    SubscriptionId,
};
