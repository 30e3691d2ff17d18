// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `roomlink` library.
//!
//! Errors are split between value validation ([`ValueError`]) and everything
//! else ([`Error`]): configuration, registration and device commands.
//!
//! Note that the public query and command surface of
//! [`EventAggregator`](crate::event::EventAggregator) and
//! [`ErrorNotificationManager`](crate::notify::ErrorNotificationManager) never
//! returns these errors to the caller. They degrade to a default value and log
//! a diagnostic instead. The errors below surface from the lower-level building
//! blocks (registry, device handles, configuration loading).

use thiserror::Error;

use crate::types::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// A device with the same identifier is already registered.
    #[error("duplicate device id: {0}")]
    DuplicateId(DeviceId),

    /// No device with the given identifier is registered.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Device does not support the requested capability.
    #[error("device {device_id} does not support {capability}")]
    CapabilityNotSupported {
        /// The device the command was addressed to.
        device_id: DeviceId,
        /// The capability that is not supported.
        capability: &'static str,
    },

    /// Device is offline.
    #[error("device is not connected")]
    NotConnected,

    /// No driver is attached to receive commands for the device.
    #[error("no driver attached to device {0}")]
    DriverDetached(DeviceId),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A device identifier was empty or whitespace.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u8,
        /// Maximum allowed value.
        max: u8,
        /// The actual value that was provided.
        actual: u8,
    },

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// An unknown severity ordinal was provided.
    #[error("invalid severity: {0}")]
    InvalidSeverity(u8),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
