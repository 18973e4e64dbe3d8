//! Cycle group identifier value object
//!
//! Cycle groups are named in the flow definition rather than numbered, so
//! the identifier wraps a `String` instead of an index, the way the
//! original analyzer's `Complexity`/`Priority` value objects wrap whatever
//! representation the domain concept actually has.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CycleGroupId(pub String);

impl fmt::Display for CycleGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CycleGroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CycleGroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
