//! Reassignment policy entity module
//!
//! A ReassignmentPolicy moves worker capacity between two resource pools
//! when a trigger fires. Evaluation and deferral live in
//! `application::services::reassignment_controller`; this module only
//! carries the static, parsed-from-input shape of a policy.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CycleGroupId, IterationIndex, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReassignmentTrigger {
    /// Fires the instant the named task starts.
    OnStart(TaskId),
    /// Fires the instant the named task completes.
    OnComplete(TaskId),
    /// Fires when a cycle group reaches iteration `k` (head start of that
    /// iteration), for every unit independently.
    OnIteration(CycleGroupId, IterationIndex),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignmentPolicy {
    pub id: String,
    pub trigger: ReassignmentTrigger,
    pub from_pool: String,
    pub to_pool: String,
    pub units: u32,
    /// Optional "only if target not already staffed" guard: when set, the
    /// move is suppressed (not deferred) if the target pool already has
    /// at least one unit active at the trigger instant.
    #[serde(default)]
    pub only_if_target_not_staffed: bool,
}
