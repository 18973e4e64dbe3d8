//! Task definition entity module
//!
//! A TaskDefinition is one node in a Flow's task arena: the static
//! description of a unit of work, independent of which unit or iteration
//! is currently executing it. The simulator instantiates many task
//! instances from one `TaskDefinition`, one per (unit, iteration) pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::value_objects::{CycleGroupId, Minutes, TaskId};

/// A task's position within its cycle group, if any. Every task belongs
/// to at most one cycle group; ordinary tasks carry `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleRole {
    /// Not part of any cycle.
    None,
    /// First task in the group; receives the back-edge from the tail.
    Head,
    /// Interior task in the group, between head and tail.
    Body,
    /// Last task in the group; its completion decides whether the group
    /// opens another iteration or closes.
    Tail,
}

impl CycleRole {
    pub fn is_cyclic(self) -> bool {
        !matches!(self, CycleRole::None)
    }
}

/// The execution kind of a task, orthogonal to its position inside a
/// cycle group (`CycleRole`). Mirrors spec §3's task-kind axis, minus
/// `cycle-head`/`cycle-tail` — those are `CycleRole::Head`/`CycleRole::Tail`
/// here rather than a second encoding of the same fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A normal task: starts once its predecessors (and cycle membership,
    /// if any) allow it, occupies a worker and/or machine, runs.
    #[default]
    Ordinary,
    /// A setup step with an optional `daily` flag; see the simulator's
    /// daily-prep gating in `application::use_cases::simulate_flow`.
    Preparation,
    /// Occupies only a machine; never draws from a worker pool.
    MechanicalProcess,
    /// Starts only via an explicit triggering event rather than ordinary
    /// predecessor completion — see `StartCondition::AutoOnEvent`.
    AutoTriggered,
}

/// What allows a task to start, per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StartCondition {
    /// Starts once all ordinary predecessors (and any cycle-iteration
    /// gating) are satisfied. The default for nearly every task.
    #[default]
    AfterPredecessors,
    /// Starts only when explicitly triggered — the flow has no
    /// predecessor-driven start for this task. The core has no external
    /// caller able to supply a mid-run trigger signal, so manual-trigger
    /// tasks are seeded as ready at `T=0` alongside the Flow's roots; see
    /// DESIGN.md for the rationale.
    ManualTrigger,
    /// Starts when a named event fires — a cycle iteration opening, a
    /// reassignment landing. Tasks with this condition are also
    /// classified `auto-triggered` by the validator.
    AutoOnEvent,
}

/// Static description of one task in a Flow. Durations are expressed in
/// working minutes and are resolved against a Calendar at simulation
/// time, never against wall-clock time directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub name: String,
    pub duration: Minutes,
    #[serde(default)]
    pub kind: TaskKind,
    #[serde(default)]
    pub start_condition: StartCondition,
    /// Pool of interchangeable workers this task draws from, if any.
    #[serde(default)]
    pub worker_pool: Option<String>,
    #[serde(default)]
    pub workers_required: u32,
    /// Pool representing the machine(s) this task occupies, if any.
    /// Disjoint from `worker_pool` — a task can hold both at once.
    #[serde(default)]
    pub machine_pool: Option<String>,
    /// Only meaningful when `kind == Preparation`: true if this step
    /// needs to run at most once per worker pool per calendar day.
    #[serde(default)]
    pub daily: bool,
    pub cycle_role: CycleRole,
    pub cycle_group: Option<CycleGroupId>,
    /// True if this task's completion can close its cycle group early,
    /// per the group's `UntilFeederComplete` bound.
    pub is_feeder: bool,
    /// Shared key for a sequential group: tasks with the same key run on
    /// one worker who moves through them, in `group_position` order,
    /// without releasing the assignment between them.
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub group_position: Option<u32>,
    /// Declared order within the flow definition; the final leg of the
    /// deterministic tie-break once unit and iteration are equal.
    pub declared_order: u32,
}

impl TaskDefinition {
    pub fn requires_worker(&self) -> bool {
        self.worker_pool.is_some() && self.workers_required > 0
    }

    pub fn requires_machine(&self) -> bool {
        self.machine_pool.is_some()
    }

    pub fn requires_resources(&self) -> bool {
        self.requires_worker() || self.requires_machine()
    }

    /// Auto-triggered by its own declared start condition, independent of
    /// the validator's structural classification (§4.2's second clause).
    pub fn declares_auto_trigger(&self) -> bool {
        matches!(self.start_condition, StartCondition::AutoOnEvent) || self.kind == TaskKind::AutoTriggered
    }
}

impl fmt::Display for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_role_is_cyclic_only_for_head_body_tail() {
        assert!(!CycleRole::None.is_cyclic());
        assert!(CycleRole::Head.is_cyclic());
        assert!(CycleRole::Body.is_cyclic());
        assert!(CycleRole::Tail.is_cyclic());
    }

    #[test]
    fn defaults_are_ordinary_after_predecessors() {
        assert_eq!(TaskKind::default(), TaskKind::Ordinary);
        assert_eq!(StartCondition::default(), StartCondition::AfterPredecessors);
    }
}
