//! Unit and iteration index value objects
//!
//! `UnitIndex` identifies one instantiated unit of demand (one product
//! unit or one lot item). `IterationIndex` identifies a pass through a
//! cycle group; tasks with no cycle membership always run at iteration 0.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitIndex(pub u32);

impl fmt::Display for UnitIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U{}", self.0)
    }
}

/// Iteration counter for a cycle group. `0` is the sentinel used by tasks
/// with no cycle membership (they have exactly one instance per unit);
/// real cycle iterations are strictly positive and start at 1, per the
/// data model's "Iteration counters are strictly monotonic" invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IterationIndex(pub u32);

impl IterationIndex {
    pub const NONE: IterationIndex = IterationIndex(0);
    pub const FIRST: IterationIndex = IterationIndex(1);

    pub fn next(self) -> IterationIndex {
        IterationIndex(self.0 + 1)
    }
}

impl fmt::Display for IterationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I{}", self.0)
    }
}
