// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Offline notices and the queue that orders them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::DeviceId;

/// One outstanding "device offline" condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    device_id: DeviceId,
    label: String,
    raised_at: DateTime<Utc>,
}

impl Notice {
    /// Creates a notice raised now.
    ///
    /// An empty label falls back to the device identifier.
    #[must_use]
    pub fn new(device_id: DeviceId, label: &str) -> Self {
        let label = match label.trim() {
            "" => device_id.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            device_id,
            label,
            raised_at: Utc::now(),
        }
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns when the notice was raised.
    #[must_use]
    pub fn raised_at(&self) -> DateTime<Utc> {
        self.raised_at
    }
}

/// Outcome of a queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeUpdate {
    /// The queue was idle; the new notice is now current.
    Displayed,
    /// The new notice waits behind the current one.
    Queued,
    /// A notice for this device already exists.
    Duplicate,
    /// The current notice was cleared and the next pending one is current.
    Advanced,
    /// The current notice was cleared and nothing is pending.
    Idle,
    /// A pending notice was removed before it was ever displayed.
    Withdrawn,
    /// No notice matched.
    NoChange,
    /// The device identifier was malformed.
    Rejected,
}

impl NoticeUpdate {
    /// Returns `true` if the current notice changed and must be rendered.
    #[must_use]
    pub fn renders(self) -> bool {
        matches!(self, Self::Displayed | Self::Advanced | Self::Idle)
    }
}

/// FIFO queue of offline notices with a single current slot.
///
/// The current notice is held apart from the pending ones, and a device has
/// at most one notice across both. The queue is idle exactly when there is no
/// current notice, in which case nothing is pending either.
///
/// The queue is plain data. [`ErrorNotificationManager`] wraps it in a lock
/// and renders the outcome of each operation.
///
/// [`ErrorNotificationManager`]: super::ErrorNotificationManager
///
/// # Examples
///
/// ```
/// use roomlink::notify::{Notice, NoticeQueue, NoticeUpdate};
/// use roomlink::types::DeviceId;
///
/// let notice = |id: &str| Notice::new(DeviceId::new(id).unwrap(), id);
/// let mut queue = NoticeQueue::new();
///
/// assert_eq!(queue.report(notice("a")), NoticeUpdate::Displayed);
/// assert_eq!(queue.report(notice("b")), NoticeUpdate::Queued);
/// assert_eq!(queue.report(notice("a")), NoticeUpdate::Duplicate);
///
/// assert_eq!(queue.clear("a"), NoticeUpdate::Advanced);
/// assert_eq!(queue.current().unwrap().label(), "b");
/// assert_eq!(queue.clear("b"), NoticeUpdate::Idle);
/// assert!(queue.is_idle());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NoticeQueue {
    current: Option<Notice>,
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    /// Creates an idle queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notice unless its device already has one.
    pub fn report(&mut self, notice: Notice) -> NoticeUpdate {
        if self.contains(notice.device_id.as_str()) {
            return NoticeUpdate::Duplicate;
        }

        if self.current.is_none() {
            self.current = Some(notice);
            NoticeUpdate::Displayed
        } else {
            self.pending.push_back(notice);
            NoticeUpdate::Queued
        }
    }

    /// Removes the notice for `device_id`, advancing if it was current.
    pub fn clear(&mut self, device_id: &str) -> NoticeUpdate {
        if self
            .current
            .as_ref()
            .is_some_and(|n| n.device_id.as_str() == device_id)
        {
            self.current = self.pending.pop_front();
            return if self.current.is_some() {
                NoticeUpdate::Advanced
            } else {
                NoticeUpdate::Idle
            };
        }

        match self
            .pending
            .iter()
            .position(|n| n.device_id.as_str() == device_id)
        {
            Some(position) => {
                self.pending.remove(position);
                NoticeUpdate::Withdrawn
            }
            None => NoticeUpdate::NoChange,
        }
    }

    /// Drops every notice.
    pub fn clear_all(&mut self) -> NoticeUpdate {
        if self.current.is_none() {
            return NoticeUpdate::NoChange;
        }
        self.current = None;
        self.pending.clear();
        NoticeUpdate::Idle
    }

    /// Returns `true` if `device_id` has a current or pending notice.
    #[must_use]
    pub fn contains(&self, device_id: &str) -> bool {
        self.iter().any(|n| n.device_id.as_str() == device_id)
    }

    /// Returns the notice currently displayed.
    #[must_use]
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// Returns the pending notices, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }

    /// Returns the current notice followed by the pending ones.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.current.iter().chain(self.pending.iter())
    }

    /// Returns the number of pending notices.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the total number of notices.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.current.is_some()) + self.pending.len()
    }

    /// Returns `true` if nothing is displayed or pending.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Alias for [`is_idle`](Self::is_idle).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}
