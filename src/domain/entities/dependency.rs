//! Dependency edge entity module
//!
//! A Flow's task graph is stored as a flat edge list rather than pointers,
//! the same arena-and-index shape the original dependency analyzer used
//! for its job graph. Every edge is tagged Ordinary or Cyclic; Cyclic
//! edges are the only back-edges the graph is allowed to contain, and they
//! must each close a single declared cycle group (checked by the flow
//! validator, not here).

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Normal forward dependency: `to` cannot start before `from` completes.
    Ordinary,
    /// The tail-to-head back-edge of a cycle group. Declared explicitly
    /// rather than discovered, so the graph itself stays a DAG plus a
    /// finite set of flagged loops instead of a true cyclic graph.
    Cyclic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: TaskId,
    pub to: TaskId,
    pub kind: EdgeKind,
}

impl Dependency {
    pub fn ordinary(from: TaskId, to: TaskId) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::Ordinary,
        }
    }

    pub fn cyclic(tail: TaskId, head: TaskId) -> Self {
        Self {
            from: tail,
            to: head,
            kind: EdgeKind::Cyclic,
        }
    }
}
