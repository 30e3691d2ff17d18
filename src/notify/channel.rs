// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status messages and the single-slot channels they are rendered to.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::ValueError;

/// Severity ordinal carried in front of every status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Severity {
    /// Nothing to report.
    Clear = 0,
    /// Informational.
    Info = 1,
    /// Degraded but usable.
    Warning = 2,
    /// Something is broken.
    Error = 3,
}

impl Severity {
    /// Returns the wire ordinal.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Severity {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, ValueError> {
        match value {
            0 => Ok(Severity::Clear),
            1 => Ok(Severity::Info),
            2 => Ok(Severity::Warning),
            3 => Ok(Severity::Error),
            other => Err(ValueError::InvalidSeverity(other)),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.ordinal()
    }
}

/// A message for the external status display.
///
/// The wire form is the severity ordinal, a colon, and the text:
///
/// ```
/// use roomlink::notify::{Severity, StatusMessage};
///
/// assert_eq!(StatusMessage::idle().to_wire(), "0:");
///
/// let offline = StatusMessage::offline("Display 1", Severity::Error, "offline");
/// assert_eq!(offline.to_string(), "3:Display 1 offline");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// Severity ordinal.
    pub severity: Severity,
    /// Free text, may be empty.
    pub text: String,
}

impl StatusMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }

    /// The baseline message shown when nothing is wrong.
    #[must_use]
    pub fn idle() -> Self {
        Self::new(Severity::Clear, String::new())
    }

    /// The message shown while a device is offline.
    #[must_use]
    pub fn offline(label: &str, severity: Severity, suffix: &str) -> Self {
        let text = if suffix.is_empty() {
            label.to_string()
        } else {
            format!("{label} {suffix}")
        };
        Self::new(severity, text)
    }

    /// Returns `true` for the baseline message.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.severity == Severity::Clear && self.text.is_empty()
    }

    /// Returns the wire payload.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.severity.ordinal(), self.text)
    }
}

/// An external single-slot display.
///
/// Each render replaces whatever the channel showed before. Implementations
/// must not block: the notification manager calls `render` while holding its
/// lock. Delivery is best effort; failures are the implementation's to log.
pub trait StatusChannel: Send + Sync {
    /// Shows `message`, replacing the previous one.
    fn render(&self, message: &StatusMessage);
}

/// In-process status channel backed by a tokio `watch`.
///
/// Receivers always see the latest message, which matches the single-slot
/// semantics of a status display.
///
/// ```
/// use roomlink::notify::{StatusChannel, StatusMessage, WatchChannel};
///
/// let channel = WatchChannel::new();
/// let rx = channel.subscribe();
///
/// channel.render(&StatusMessage::idle());
/// assert_eq!(rx.borrow().to_wire(), "0:");
/// ```
#[derive(Debug)]
pub struct WatchChannel {
    tx: watch::Sender<StatusMessage>,
}

impl WatchChannel {
    /// Creates a channel showing the idle message.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(StatusMessage::idle());
        Self { tx }
    }

    /// Subscribes to rendered messages.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StatusMessage> {
        self.tx.subscribe()
    }

    /// Returns the message currently shown.
    #[must_use]
    pub fn current(&self) -> StatusMessage {
        self.tx.borrow().clone()
    }
}

impl Default for WatchChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusChannel for WatchChannel {
    fn render(&self, message: &StatusMessage) {
        // send_replace keeps the slot current even with no receivers
        self.tx.send_replace(message.clone());
    }
}

#[cfg(feature = "mqtt")]
pub use mqtt::MqttStatusChannel;

#[cfg(feature = "mqtt")]
mod mqtt {
    use rumqttc::{AsyncClient, QoS};

    use super::{StatusChannel, StatusMessage};

    /// Status channel that publishes to a retained MQTT topic.
    ///
    /// Messages are queued on the client without waiting; the broker keeps
    /// the last one for late subscribers. The client's event loop must be
    /// polled elsewhere.
    #[derive(Debug, Clone)]
    pub struct MqttStatusChannel {
        client: AsyncClient,
        topic: String,
    }

    impl MqttStatusChannel {
        /// Creates a channel publishing to `topic`.
        #[must_use]
        pub fn new(client: AsyncClient, topic: impl Into<String>) -> Self {
            Self {
                client,
                topic: topic.into(),
            }
        }

        /// Returns the status topic.
        #[must_use]
        pub fn topic(&self) -> &str {
            &self.topic
        }
    }

    impl StatusChannel for MqttStatusChannel {
        fn render(&self, message: &StatusMessage) {
            let payload = message.to_wire();
            tracing::debug!(topic = %self.topic, payload = %payload, "Publishing status message");

            if let Err(e) = self
                .client
                .try_publish(self.topic.as_str(), QoS::AtLeastOnce, true, payload)
            {
                tracing::warn!(topic = %self.topic, error = %e, "Failed to publish status message");
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use std::sync::Arc;

        use rumqttc::{EventLoop, MqttOptions, Request};

        use super::*;
        use crate::config::NotificationConfig;
        use crate::notify::{ErrorNotificationManager, Severity};

        const TOPIC: &str = "room/101/status";

        fn channel(cap: usize) -> (MqttStatusChannel, EventLoop) {
            let options = MqttOptions::new("roomlink-test", "localhost", 1883);
            let (client, eventloop) = AsyncClient::new(options, cap);
            (MqttStatusChannel::new(client, TOPIC), eventloop)
        }

        /// Collects the publishes queued on the client without touching the network.
        fn queued(eventloop: &mut EventLoop) -> Vec<(String, QoS, bool, String)> {
            eventloop.clean();
            eventloop
                .pending
                .drain(..)
                .filter_map(|request| match request {
                    Request::Publish(p) => Some((
                        p.topic,
                        p.qos,
                        p.retain,
                        String::from_utf8(p.payload.to_vec()).unwrap(),
                    )),
                    _ => None,
                })
                .collect()
        }

        #[test]
        fn publishes_retained_wire_messages() {
            let (channel, mut eventloop) = channel(8);
            assert_eq!(channel.topic(), TOPIC);

            channel.render(&StatusMessage::offline("Display 1", Severity::Error, "offline"));
            channel.render(&StatusMessage::idle());

            assert_eq!(
                queued(&mut eventloop),
                [
                    (
                        TOPIC.to_string(),
                        QoS::AtLeastOnce,
                        true,
                        "3:Display 1 offline".to_string()
                    ),
                    (TOPIC.to_string(), QoS::AtLeastOnce, true, "0:".to_string()),
                ]
            );
        }

        #[test]
        fn full_client_queue_drops_without_blocking() {
            let (channel, mut eventloop) = channel(1);

            channel.render(&StatusMessage::offline("Display 1", Severity::Error, "offline"));
            for _ in 0..10 {
                channel.render(&StatusMessage::idle());
            }

            let payloads: Vec<String> = queued(&mut eventloop).into_iter().map(|q| q.3).collect();
            assert_eq!(payloads, ["3:Display 1 offline"]);

            // Once drained the channel publishes again.
            channel.render(&StatusMessage::idle());
            let payloads: Vec<String> = queued(&mut eventloop).into_iter().map(|q| q.3).collect();
            assert_eq!(payloads, ["0:"]);
        }

        #[test]
        fn drives_the_notification_manager() {
            let (channel, mut eventloop) = channel(1);
            let manager =
                ErrorNotificationManager::new(Arc::new(channel), NotificationConfig::default());
            assert_eq!(queued(&mut eventloop).len(), 1);

            manager.report_offline("display-1", "Display 1");
            let payloads: Vec<String> = queued(&mut eventloop).into_iter().map(|q| q.3).collect();
            assert_eq!(payloads, ["3:Display 1 offline"]);

            manager.clear_offline("display-1");
            let payloads: Vec<String> = queued(&mut eventloop).into_iter().map(|q| q.3).collect();
            assert_eq!(payloads, ["0:"]);
        }
    }
}
