//! Cycle iteration controller
//!
//! Tracks, per (unit, cycle group), which iteration is currently open and
//! whether the group has closed. This is the only place that interprets a
//! cycle group's bound; everything downstream of a closed group just
//! checks `is_closed` as part of generic predecessor-readiness.

use std::collections::HashMap;

use crate::domain::entities::{CycleBound, CycleGroup};
use crate::domain::value_objects::{CycleGroupId, IterationIndex, UnitIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// Accepting further iterations.
    Open,
    /// The iteration currently running is the group's last.
    Closing,
    /// All iterations have completed; the group's external successors may
    /// now become ready.
    Closed,
}

#[derive(Debug, Clone)]
struct GroupState {
    iteration: IterationIndex,
    status: CycleStatus,
    feeder_completed_this_iteration: bool,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            iteration: IterationIndex::FIRST,
            status: CycleStatus::Open,
            feeder_completed_this_iteration: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct CycleController {
    states: HashMap<(UnitIndex, CycleGroupId), GroupState>,
}

impl CycleController {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, unit: UnitIndex, group: &CycleGroupId) -> &mut GroupState {
        self.states.entry((unit, group.clone())).or_default()
    }

    /// The iteration a unit is currently on for this group; a group that
    /// has not started yet is on iteration 1.
    pub fn current_iteration(&self, unit: UnitIndex, group: &CycleGroupId) -> IterationIndex {
        self.states
            .get(&(unit, group.clone()))
            .map(|s| s.iteration)
            .unwrap_or(IterationIndex::FIRST)
    }

    pub fn status(&self, unit: UnitIndex, group: &CycleGroupId) -> CycleStatus {
        self.states
            .get(&(unit, group.clone()))
            .map(|s| s.status)
            .unwrap_or(CycleStatus::Open)
    }

    pub fn is_closed(&self, unit: UnitIndex, group: &CycleGroupId) -> bool {
        self.status(unit, group) == CycleStatus::Closed
    }

    /// Marks that the group's designated feeder completed during the
    /// iteration currently open for `unit`.
    pub fn on_feeder_complete(&mut self, unit: UnitIndex, group: &CycleGroupId) {
        self.entry(unit, group).feeder_completed_this_iteration = true;
    }

    /// Called when a group's tail task completes for `unit`. Decides
    /// whether another iteration opens or the group closes, and returns
    /// the resulting status.
    pub fn on_tail_complete(&mut self, unit: UnitIndex, group: &CycleGroup) -> CycleStatus {
        let entry = self.entry(unit, &group.id);
        let should_close = match &group.bound {
            CycleBound::Fixed(n) => entry.iteration.0 >= *n,
            CycleBound::UntilFeederComplete => entry.feeder_completed_this_iteration,
        };

        if should_close {
            entry.status = CycleStatus::Closed;
        } else {
            entry.iteration = entry.iteration.next();
            entry.feeder_completed_this_iteration = false;
            entry.status = CycleStatus::Open;
        }
        entry.status
    }
}
