// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay addressing for discrete relay controllers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Index of a relay on a relay controller.
///
/// Relay controllers (screen lifts, shade motors, door strikes) expose up to
/// 16 relays, indexed from 1.
///
/// # Examples
///
/// ```
/// use roomlink::types::RelayIndex;
///
/// let idx = RelayIndex::new(3).unwrap();
/// assert_eq!(idx.value(), 3);
///
/// assert!(RelayIndex::new(0).is_err());
/// assert!(RelayIndex::new(17).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RelayIndex(u8);

impl RelayIndex {
    /// Maximum valid relay index.
    pub const MAX: u8 = 16;

    /// Creates a new relay index.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if index is 0 or greater than 16.
    pub fn new(index: u8) -> Result<Self, ValueError> {
        if index == 0 || index > Self::MAX {
            return Err(ValueError::OutOfRange {
                min: 1,
                max: Self::MAX,
                actual: index,
            });
        }
        Ok(Self(index))
    }

    /// Relay 1.
    #[must_use]
    pub const fn first() -> Self {
        Self(1)
    }

    /// Returns the numeric value of the index.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for RelayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for RelayIndex {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelayIndex> for u8 {
    fn from(index: RelayIndex) -> Self {
        index.0
    }
}
