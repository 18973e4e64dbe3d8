//! Working-minutes value object module
//!
//! Durations in the scheduler are always expressed in working minutes —
//! minutes that the Calendar has already agreed are inside a shift and
//! outside a break. Wrapping the raw integer keeps a duration from being
//! accidentally compared against or added to a wall-clock minute count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Minutes(pub u32);

impl Minutes {
    pub const ZERO: Minutes = Minutes(0);

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Add for Minutes {
    type Output = Minutes;

    fn add(self, rhs: Minutes) -> Minutes {
        Minutes(self.0 + rhs.0)
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl From<u32> for Minutes {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
