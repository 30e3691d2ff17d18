// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Unique identifier of a configured device.
///
/// Identifiers come from configuration and are stable for the lifetime of the
/// process. They are trimmed on construction and must not be empty.
///
/// `DeviceId` implements `Borrow<str>`, so maps keyed by it can be queried with
/// a plain `&str` coming from a caller.
///
/// # Examples
///
/// ```
/// use roomlink::types::DeviceId;
///
/// let id = DeviceId::new(" display-1 ").unwrap();
/// assert_eq!(id.as_str(), "display-1");
///
/// assert!(DeviceId::new("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::EmptyDeviceId`] if the trimmed input is empty.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyDeviceId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}
