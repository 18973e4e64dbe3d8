//! Task identifier value object module
//!
//! Tasks live in a contiguous arena inside a Flow; a TaskId is the index
//! into that arena. Keeping identity as a small integer rather than a
//! pointer or string keeps cyclic dependency graphs trivially representable
//! (a back-edge is just another `(TaskId, TaskId)` pair, not a pointer cycle).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a Task Definition inside a Flow's task arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Returns the arena index this id addresses.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl From<u32> for TaskId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<usize> for TaskId {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}
