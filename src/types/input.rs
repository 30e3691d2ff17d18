// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Selected source input on a display or switcher, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct InputIndex(u8);

impl InputIndex {
    /// Maximum valid input index.
    pub const MAX: u8 = 64;

    /// Creates a new input index.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if index is 0 or greater than 64.
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

    /// Returns the numeric value of the index.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for InputIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for InputIndex {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InputIndex> for u8 {
    fn from(index: InputIndex) -> Self {
        index.0
    }
}
