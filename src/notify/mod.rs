// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offline notifications for a single-slot status display.
//!
//! When a device goes offline, the [`ErrorNotificationManager`] raises a
//! [`Notice`] for it. Notices are shown one at a time, oldest first, on a
//! [`StatusChannel`] as `"<severity>:<text>"`, for example
//! `"3:Display 1 offline"`. When nothing is wrong the channel shows `"0:"`.
//!
//! The manager is fed either synchronously, by
//! [`attach`](ErrorNotificationManager::attach)ing it to an
//! [`EventAggregator`](crate::event::EventAggregator), or from a tokio task
//! started with [`spawn_listener`](ErrorNotificationManager::spawn_listener).

mod channel;
mod manager;
mod notice;

#[cfg(feature = "mqtt")]
pub use channel::MqttStatusChannel;
pub use channel::{Severity, StatusChannel, StatusMessage, WatchChannel};
pub use manager::ErrorNotificationManager;
pub use notice::{Notice, NoticeQueue, NoticeUpdate};
