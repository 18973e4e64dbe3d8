//! Cycle group entity module
//!
//! A CycleGroup names the head/tail pair a Cyclic dependency closes and
//! the bound that decides when the loop stops. Runtime iteration state
//! (which iteration a unit is on, whether the group has closed) is not
//! part of this static definition — see
//! `application::services::cycle_controller`.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CycleGroupId, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleBound {
    /// The group always runs exactly `n` iterations.
    Fixed(u32),
    /// The group keeps opening iterations until the named feeder task
    /// completes within an iteration; that iteration is the last one.
    UntilFeederComplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleGroup {
    pub id: CycleGroupId,
    pub head: TaskId,
    pub tail: TaskId,
    pub bound: CycleBound,
}
