//! Simulation trace
//!
//! A flat, chronologically-sorted log of every task instance the
//! simulator ran. This is the data the JSON report and the optimiser's
//! makespan calculation both read back from a completed run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CycleGroupId, IterationIndex, Minutes, TaskId, UnitIndex};

/// Why a task instance started when it did rather than earlier, drawn
/// from the fixed enumeration in spec §4.11. Exactly one reason is
/// recorded per instance — the binding constraint the simulator found
/// when it computed the instance's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitReason {
    WaitedOnPredecessor,
    WaitedOnWorker,
    WaitedOnMachine,
    WaitedOnCalendar,
    CycleIterationOpen,
    ReassignmentDeferred,
    DailyPrepSkipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub task: TaskId,
    pub task_name: String,
    pub unit: UnitIndex,
    pub iteration: IterationIndex,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub worker_pool: Option<String>,
    pub machine_pool: Option<String>,
    pub cycle_group: Option<CycleGroupId>,
    pub reason: WaitReason,
}

impl TraceEntry {
    pub fn duration(&self) -> Minutes {
        Minutes(((self.end - self.start).num_minutes()).max(0) as u32)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Sorts by completion time, then start time, then task id — a stable
    /// presentation order independent of the event queue's internal
    /// tie-break sequence.
    pub fn sorted(mut self) -> Self {
        self.entries
            .sort_by(|a, b| (a.end, a.start, a.task).cmp(&(b.end, b.start, b.task)));
        self
    }

    pub fn makespan(&self) -> Minutes {
        let earliest = self.entries.iter().map(|e| e.start).min();
        let latest = self.entries.iter().map(|e| e.end).max();
        match (earliest, latest) {
            (Some(s), Some(e)) => Minutes(((e - s).num_minutes()).max(0) as u32),
            _ => Minutes::ZERO,
        }
    }

    /// The pool most often the binding constraint on a task instance's
    /// start — the bottleneck report spec §6 asks `SimulationResult` to
    /// carry.
    pub fn bottleneck_pool(&self) -> Option<String> {
        use std::collections::HashMap;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for entry in &self.entries {
            match entry.reason {
                WaitReason::WaitedOnWorker | WaitReason::ReassignmentDeferred => {
                    if let Some(pool) = &entry.worker_pool {
                        *counts.entry(pool.clone()).or_insert(0) += 1;
                    }
                }
                WaitReason::WaitedOnMachine => {
                    if let Some(pool) = &entry.machine_pool {
                        *counts.entry(pool.clone()).or_insert(0) += 1;
                    }
                }
                _ => {}
            }
        }
        counts.into_iter().max_by_key(|(_, count)| *count).map(|(pool, _)| pool)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn entry(task: u32, start: NaiveDateTime, end: NaiveDateTime, reason: WaitReason, worker_pool: Option<&str>) -> TraceEntry {
        TraceEntry {
            task: TaskId(task),
            task_name: format!("t{task}"),
            unit: UnitIndex(0),
            iteration: IterationIndex::NONE,
            start,
            end,
            worker_pool: worker_pool.map(str::to_string),
            machine_pool: None,
            cycle_group: None,
            reason,
        }
    }

    #[test]
    fn makespan_spans_earliest_start_to_latest_end() {
        let mut trace = Trace::new();
        trace.record(entry(0, t(8), t(9), WaitReason::WaitedOnPredecessor, None));
        trace.record(entry(1, t(9), t(11), WaitReason::WaitedOnPredecessor, None));
        assert_eq!(trace.makespan(), Minutes(180));
    }

    #[test]
    fn bottleneck_pool_is_the_most_frequent_wait_cause() {
        let mut trace = Trace::new();
        trace.record(entry(0, t(8), t(9), WaitReason::WaitedOnWorker, Some("line-a")));
        trace.record(entry(1, t(9), t(10), WaitReason::WaitedOnWorker, Some("line-a")));
        trace.record(entry(2, t(10), t(11), WaitReason::WaitedOnWorker, Some("line-b")));
        assert_eq!(trace.bottleneck_pool(), Some("line-a".to_string()));
    }
}
