// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room configuration.
//!
//! A room is described by an ordered list of devices and the settings of the
//! offline notification channel. Configuration is read from JSON:
//!
//! ```json
//! {
//!   "devices": [
//!     { "id": "display-1", "label": "Display 1",
//!       "capabilities": { "power": true, "inputs": 4 } },
//!     { "id": "lift", "label": "Screen Lift",
//!       "capabilities": { "relays": 2 } }
//!   ],
//!   "notifications": { "offline_severity": 3, "offline_suffix": "offline" }
//! }
//! ```
//!
//! Device entries are validated individually when the
//! [`DeviceRegistry`](crate::DeviceRegistry) is built, so one bad entry does
//! not prevent the rest of the room from starting.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::Capabilities;
use crate::error::Result;
use crate::notify::Severity;

/// Configuration of one room.
///
/// # Examples
///
/// ```
/// use roomlink::config::RoomConfig;
///
/// let config = RoomConfig::from_json_str(r#"{
///     "devices": [{ "id": "display-1", "label": "Display 1" }]
/// }"#).unwrap();
///
/// assert_eq!(config.devices.len(), 1);
/// assert_eq!(config.notifications.offline_suffix, "offline");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Devices in configuration order.
    pub devices: Vec<DeviceConfig>,
    /// Offline notification settings.
    pub notifications: NotificationConfig,
}

impl RoomConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read and
    /// [`Error::Config`](crate::Error::Config) if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            devices = config.devices.len(),
            "Loaded room configuration"
        );
        Ok(config)
    }
}

/// Configuration of one device.
///
/// Fields are defaulted during parsing so that a missing identifier is
/// reported per device at registration time instead of failing the whole
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (required, non-empty).
    #[serde(default)]
    pub id: String,
    /// Human-readable label; falls back to the identifier when empty.
    #[serde(default)]
    pub label: String,
    /// Optional control interfaces.
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl DeviceConfig {
    /// Creates a configuration entry with connectivity-only capabilities.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            capabilities: Capabilities::basic(),
        }
    }

    /// Sets the device capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Settings for the offline notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Severity used for "device offline" notices. Must not be
    /// [`Severity::Clear`], which the display reserves for idle.
    #[serde(deserialize_with = "offline_severity")]
    pub offline_severity: Severity,
    /// Text appended to the device label in an offline notice.
    pub offline_suffix: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            offline_severity: Severity::Error,
            offline_suffix: "offline".to_string(),
        }
    }
}

fn offline_severity<'de, D>(deserializer: D) -> std::result::Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    match Severity::deserialize(deserializer)? {
        Severity::Clear => Err(de::Error::custom(
            "offline_severity 0 is reserved for the idle message",
        )),
        severity => Ok(severity),
    }
}
