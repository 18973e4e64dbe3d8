//! Discrete-event queue
//!
//! A min-priority queue ordered by `(fire_at, sequence)`. `sequence` is a
//! strictly increasing counter assigned at push time, so two events
//! scheduled for the same instant fire in the order they were enqueued.
//! The simulator always enqueues in unit-ascending, then
//! iteration-ascending, then declared-task-order, so that insertion order
//! alone reproduces the deterministic tie-break the scheduler's contract
//! requires.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::NaiveDateTime;

use crate::domain::value_objects::{IterationIndex, TaskId, UnitIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Re-checks whether a task instance's predecessors (and, for a cycle
    /// head, the group's status) now allow it to start.
    ReadyCheck {
        task: TaskId,
        unit: UnitIndex,
        iteration: IterationIndex,
    },
    Start {
        task: TaskId,
        unit: UnitIndex,
        iteration: IterationIndex,
    },
    Complete {
        task: TaskId,
        unit: UnitIndex,
        iteration: IterationIndex,
    },
    /// Emitted for trace fidelity when a resource pool's occupancy drops;
    /// readiness itself is decided from the resource ledger directly, not
    /// from this event.
    ResourceFree { pool: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub fire_at: NaiveDateTime,
    pub sequence: u64,
    pub kind: EventKind,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so a `BinaryHeap` (a max-heap) pops the earliest event.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    next_sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fire_at: NaiveDateTime, kind: EventKind) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Event {
            fire_at,
            sequence,
            kind,
        });
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
