// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offline notification manager.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::config::NotificationConfig;
use crate::event::{AppEvent, EventAggregator};
use crate::registry::DeviceRegistry;
use crate::subscription::SubscriptionId;
use crate::types::DeviceId;

use super::{Notice, NoticeQueue, NoticeUpdate, Severity, StatusChannel, StatusMessage};

/// Presents one "device offline" notice at a time on a status channel.
///
/// Reports are deduplicated per device and displayed first-reported,
/// first-displayed. Every queue mutation and the render it causes happen
/// under one lock, so the channel never shows anything but the current
/// notice, even when devices flap concurrently.
///
/// Construction renders the idle message so the channel starts from a known
/// state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use roomlink::config::NotificationConfig;
/// use roomlink::notify::{ErrorNotificationManager, WatchChannel};
///
/// let channel = Arc::new(WatchChannel::new());
/// let manager = ErrorNotificationManager::new(channel.clone(), NotificationConfig::default());
///
/// manager.report_offline("d1", "Display 1");
/// manager.report_offline("d2", "Display 2");
/// assert_eq!(channel.current().to_wire(), "3:Display 1 offline");
///
/// manager.clear_offline("d1");
/// assert_eq!(channel.current().to_wire(), "3:Display 2 offline");
///
/// manager.clear_offline("d2");
/// assert_eq!(channel.current().to_wire(), "0:");
/// ```
pub struct ErrorNotificationManager {
    queue: Mutex<NoticeQueue>,
    channel: Arc<dyn StatusChannel>,
    config: NotificationConfig,
}

impl ErrorNotificationManager {
    /// Creates an idle manager and renders the idle message.
    ///
    /// An offline severity of [`Severity::Clear`] would render notices that
    /// read as idle, so it is replaced with [`Severity::Error`].
    #[must_use]
    pub fn new(channel: Arc<dyn StatusChannel>, mut config: NotificationConfig) -> Self {
        if config.offline_severity == Severity::Clear {
            tracing::warn!(
                fallback = Severity::Error.ordinal(),
                "Offline severity 0 is reserved for idle"
            );
            config.offline_severity = Severity::Error;
        }
        channel.render(&StatusMessage::idle());
        Self {
            queue: Mutex::new(NoticeQueue::new()),
            channel,
            config,
        }
    }

    /// Records that a device went offline.
    ///
    /// Empty identifiers are rejected. A device that already has a notice is
    /// left alone.
    pub fn report_offline(&self, id: &str, label: &str) -> NoticeUpdate {
        let Some(device_id) = checked_id(id, "report_offline") else {
            return NoticeUpdate::Rejected;
        };
        let notice = Notice::new(device_id, label);

        let mut queue = self.queue.lock();
        let update = queue.report(notice);
        match update {
            NoticeUpdate::Duplicate => {
                tracing::debug!(device_id = id, "Offline notice already present");
            }
            NoticeUpdate::Queued => {
                tracing::debug!(device_id = id, pending = queue.pending_len(), "Offline notice queued");
            }
            _ => {}
        }
        self.render_if_needed(&queue, update);
        update
    }

    /// Records that a device is back online.
    ///
    /// Withdraws the device's pending notice, or advances to the next notice
    /// if it was the one displayed. Unknown devices are a no-op.
    pub fn clear_offline(&self, id: &str) -> NoticeUpdate {
        let Some(device_id) = checked_id(id, "clear_offline") else {
            return NoticeUpdate::Rejected;
        };

        let mut queue = self.queue.lock();
        let update = queue.clear(device_id.as_str());
        if update == NoticeUpdate::Withdrawn {
            tracing::debug!(%device_id, "Pending offline notice withdrawn");
        }
        self.render_if_needed(&queue, update);
        update
    }

    /// Drops every notice and renders the idle message.
    pub fn clear_all(&self) -> NoticeUpdate {
        let mut queue = self.queue.lock();
        let update = queue.clear_all();
        self.render_if_needed(&queue, update);
        update
    }

    /// Brings the queue in line with the devices' current connectivity.
    ///
    /// Offline devices are reported and online ones cleared, in registration
    /// order. Meant for startup, where devices that never came up should be
    /// reported too.
    pub fn reconcile(&self, registry: &DeviceRegistry) {
        for device in registry.all() {
            if device.is_online() {
                self.clear_offline(device.id().as_str());
            } else {
                self.report_offline(device.id().as_str(), device.label());
            }
        }
    }

    /// Brings the queue in line with the devices after missed events.
    ///
    /// Like [`reconcile`](Self::reconcile), except that an offline device is
    /// only reported if it has been online before. That is the notice the
    /// missed offline event would have raised; a device that never came up
    /// is left as it was.
    pub fn resync(&self, registry: &DeviceRegistry) {
        for device in registry.all() {
            if device.is_online() {
                self.clear_offline(device.id().as_str());
            } else if device.has_been_online() {
                self.report_offline(device.id().as_str(), device.label());
            }
        }
    }

    /// Applies an application event.
    ///
    /// Only connectivity events matter; the label comes from the registry.
    pub fn handle_event(&self, event: &AppEvent, registry: &DeviceRegistry) {
        let AppEvent::ConnectivityChanged { device_id, online } = event else {
            return;
        };

        if *online {
            self.clear_offline(device_id.as_str());
        } else {
            let label = registry
                .lookup(device_id.as_str())
                .map_or(device_id.as_str(), |device| device.label());
            self.report_offline(device_id.as_str(), label);
        }
    }

    /// Registers the manager as a synchronous handler on the aggregator.
    ///
    /// Notices then change on the thread that raised the connectivity
    /// notification, in aggregator publication order.
    pub fn attach(self: &Arc<Self>, aggregator: &EventAggregator) -> SubscriptionId {
        let manager = Arc::clone(self);
        let registry = Arc::clone(aggregator.registry());
        aggregator.on_event(move |event| manager.handle_event(event, &registry))
    }

    /// Spawns a task that applies events from a broadcast receiver.
    ///
    /// If the receiver lags, the queue is brought back in line with
    /// [`resync`](Self::resync). The task ends when the channel closes.
    pub fn spawn_listener(
        self: Arc<Self>,
        registry: Arc<DeviceRegistry>,
        mut events: broadcast::Receiver<AppEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => self.handle_event(&event, &registry),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification listener lagged, resyncing");
                        self.resync(&registry);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Event channel closed, stopping notification listener");
                        break;
                    }
                }
            }
        })
    }

    /// Returns a copy of the queue.
    #[must_use]
    pub fn snapshot(&self) -> NoticeQueue {
        self.queue.lock().clone()
    }

    /// Returns the notice currently displayed.
    #[must_use]
    pub fn current(&self) -> Option<Notice> {
        self.queue.lock().current().cloned()
    }

    /// Returns `true` if no notice is displayed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.queue.lock().is_idle()
    }

    /// Returns the number of notices waiting behind the current one.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.lock().pending_len()
    }

    /// Returns the notification settings.
    #[must_use]
    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Renders the current notice. Called with the queue lock held.
    fn render_if_needed(&self, queue: &NoticeQueue, update: NoticeUpdate) {
        if !update.renders() {
            return;
        }

        let message = match queue.current() {
            Some(notice) => StatusMessage::offline(
                notice.label(),
                self.config.offline_severity,
                &self.config.offline_suffix,
            ),
            None => StatusMessage::idle(),
        };
        tracing::info!(
            ?update,
            pending = queue.pending_len(),
            payload = %message,
            "Rendering status"
        );
        self.channel.render(&message);
    }
}

fn checked_id(id: &str, operation: &'static str) -> Option<DeviceId> {
    match DeviceId::new(id) {
        Ok(device_id) => Some(device_id),
        Err(e) => {
            tracing::warn!(operation, error = %e, "Rejecting malformed device id");
            None
        }
    }
}

impl std::fmt::Debug for ErrorNotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorNotificationManager")
            .field("queue", &*self.queue.lock())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
