//! Flow simulation use case
//!
//! Runs a discrete-event simulation of a validated Flow against a set of
//! demand units. The event queue only ever carries three live event
//! kinds end to end (`ReadyCheck`, `Start`, `Complete`); `ResourceFree` is
//! pushed purely so a trace consumer can see when a pool's occupancy
//! dropped; readiness itself is always decided from the resource ledger
//! directly, never from the event it emits.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::trace as trace_log;

use crate::application::services::{
    CycleController, CycleStatus, DeferredLanding, Event, EventKind, EventQueue, ReassignmentController, Trace, TraceEntry, WaitReason,
};
use crate::application::use_cases::expand_lots::Demand;
use crate::application::use_cases::validate_flow::ValidateFlow;
use crate::domain::entities::task::{CycleRole, StartCondition, TaskKind};
use crate::domain::entities::{CycleGroup, Flow, ResourceLedger, TaskDefinition};
use crate::domain::value_objects::{CycleGroupId, IterationIndex, Minutes, TaskId, UnitIndex};
use crate::errors::SchedulerError;

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub trace: Trace,
    pub makespan: Minutes,
    pub units_simulated: u32,
}

impl SimulationResult {
    pub fn bottleneck_pool(&self) -> Option<String> {
        self.trace.bottleneck_pool()
    }
}

pub struct SimulateFlow;

impl SimulateFlow {
    pub fn run(flow: &Flow, demand: &Demand, start: NaiveDateTime) -> Result<SimulationResult, SchedulerError> {
        ValidateFlow::validate(flow)?;
        let units = crate::application::use_cases::expand_lots::LotExpander::expand(demand)?;
        let mut sim = Simulator::new(flow, start);
        sim.seed_sources(&units)?;
        sim.drain()?;
        sim.check_deadlock()?;
        Ok(sim.into_result())
    }
}

struct Simulator<'a> {
    flow: &'a Flow,
    start: NaiveDateTime,
    queue: EventQueue,
    ledger: ResourceLedger,
    cycle_ctl: CycleController,
    trace: Trace,
    started_at: HashMap<(TaskId, UnitIndex, IterationIndex), NaiveDateTime>,
    completed_at: HashMap<(TaskId, UnitIndex, IterationIndex), NaiveDateTime>,
    started: HashSet<(TaskId, UnitIndex, IterationIndex)>,
    last_tail_completion: HashMap<(UnitIndex, CycleGroupId), NaiveDateTime>,
    /// Floor on when a cycle head's next iteration may start, set when the
    /// previous iteration's tail fires the back-edge. The back-edge is a
    /// Cyclic edge, invisible to ordinary-predecessor readiness, so this
    /// is the only place that constraint is tracked.
    head_reiteration_floor: HashMap<(TaskId, UnitIndex, IterationIndex), NaiveDateTime>,
    /// `(worker_pool, calendar day)` already serviced by a daily
    /// preparation step; further ready-checks against the same pool and
    /// day no-op per spec §4.8.
    daily_prep_done: HashSet<(String, NaiveDate)>,
    /// Landing instants of reassignments that were deferred past their
    /// trigger time, keyed by destination pool, so a task instance that
    /// starts exactly when one lands can be attributed to
    /// `ReassignmentDeferred` rather than a plain worker/machine wait.
    reassignment_landings: HashSet<(String, NaiveDateTime)>,
    /// The binding wait reason computed when a task instance was marked
    /// started, consumed by `handle_complete` when the trace entry for
    /// that instance is finally recorded.
    pending_reason: HashMap<(TaskId, UnitIndex, IterationIndex), WaitReason>,
    unit_count: u32,
}

impl<'a> Simulator<'a> {
    fn new(flow: &'a Flow, start: NaiveDateTime) -> Self {
        Self {
            flow,
            start,
            queue: EventQueue::new(),
            ledger: ResourceLedger::new(flow.resource_pools.clone()),
            cycle_ctl: CycleController::new(),
            trace: Trace::new(),
            started_at: HashMap::new(),
            completed_at: HashMap::new(),
            started: HashSet::new(),
            last_tail_completion: HashMap::new(),
            head_reiteration_floor: HashMap::new(),
            daily_prep_done: HashSet::new(),
            reassignment_landings: HashSet::new(),
            pending_reason: HashMap::new(),
            unit_count: 0,
        }
    }

    /// Pushes a ReadyCheck at `T=0` for every root task (no ordinary
    /// predecessors) and every manually-triggered task regardless of its
    /// predecessors — a manual trigger starts independent of the Flow's
    /// predecessor edges, which the core has no external caller to fire
    /// mid-run, so it is seeded alongside the roots (see DESIGN.md). Order
    /// is unit-ascending, then declared-order-ascending, matching the
    /// event queue's insertion tie-break.
    fn seed_sources(&mut self, units: &[UnitIndex]) -> Result<(), SchedulerError> {
        self.unit_count = units.len() as u32;
        let mut sources: Vec<&TaskDefinition> = self
            .flow
            .tasks
            .iter()
            .filter(|t| {
                self.flow.ordinary_predecessors(t.id).next().is_none()
                    || t.start_condition == StartCondition::ManualTrigger
            })
            .collect();
        sources.sort_by_key(|t| t.declared_order);

        for &unit in units {
            for task in &sources {
                self.queue.push(
                    self.start,
                    EventKind::ReadyCheck {
                        task: task.id,
                        unit,
                        iteration: IterationIndex::NONE,
                    },
                );
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), SchedulerError> {
        while let Some(event) = self.queue.pop() {
            self.handle(event)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: Event) -> Result<(), SchedulerError> {
        match event.kind {
            EventKind::ReadyCheck { task, unit, .. } => self.handle_ready_check(task, unit, event.fire_at),
            EventKind::Start { task, unit, iteration } => {
                trace_log!(%task, %unit, %iteration, at = %event.fire_at, "task started");
                Ok(())
            }
            EventKind::Complete { task, unit, iteration } => self.handle_complete(task, unit, iteration, event.fire_at),
            EventKind::ResourceFree { pool } => {
                trace_log!(%pool, at = %event.fire_at, "pool occupancy dropped");
                Ok(())
            }
        }
    }

    fn task_iteration(&self, task: &TaskDefinition, unit: UnitIndex) -> IterationIndex {
        match &task.cycle_group {
            None => IterationIndex::NONE,
            Some(group) => self.cycle_ctl.current_iteration(unit, group),
        }
    }

    /// Returns the completion instant of `pred_id` that gates `task`, or
    /// `None` if it has not happened yet. Predecessors inside the same
    /// cycle group as `task` are matched by the shared current iteration;
    /// predecessors in a different (or no) group must have their whole
    /// group closed, and gate on the group's last tail completion.
    fn predecessor_completion(
        &self,
        task: &TaskDefinition,
        pred_id: TaskId,
        unit: UnitIndex,
        candidate_iteration: IterationIndex,
    ) -> Option<NaiveDateTime> {
        let pred = self.flow.task(pred_id)?;
        let same_group = matches!((&task.cycle_group, &pred.cycle_group), (Some(a), Some(b)) if a == b);

        if same_group {
            self.completed_at.get(&(pred_id, unit, candidate_iteration)).copied()
        } else if let Some(group) = &pred.cycle_group {
            if self.cycle_ctl.is_closed(unit, group) {
                self.last_tail_completion.get(&(unit, group.clone())).copied()
            } else {
                None
            }
        } else {
            self.completed_at.get(&(pred_id, unit, IterationIndex::NONE)).copied()
        }
    }

    fn handle_ready_check(&mut self, task_id: TaskId, unit: UnitIndex, _fire_at: NaiveDateTime) -> Result<(), SchedulerError> {
        let task = self.flow.task(task_id).ok_or(SchedulerError::UnknownTask(task_id))?.clone();
        let iteration = self.task_iteration(&task, unit);
        let key = (task_id, unit, iteration);
        if self.started.contains(&key) {
            return Ok(());
        }

        // Manual-trigger tasks ignore predecessor gating entirely; they
        // are ready as soon as the clock allows them to be, per
        // `StartCondition::ManualTrigger`'s contract.
        let preds: Vec<TaskId> = if task.start_condition == StartCondition::ManualTrigger {
            Vec::new()
        } else {
            self.flow.ordinary_predecessors(task_id).collect()
        };

        let mut earliest = self.start;
        let mut reason = WaitReason::WaitedOnPredecessor;

        if let Some(floor) = self.head_reiteration_floor.get(&key).copied() {
            if floor > earliest {
                earliest = floor;
                reason = WaitReason::CycleIterationOpen;
            }
        }

        for pred_id in &preds {
            match self.predecessor_completion(&task, *pred_id, unit, iteration) {
                Some(t) => {
                    if t > earliest {
                        earliest = t;
                        reason = WaitReason::WaitedOnPredecessor;
                    }
                }
                None => return Ok(()), // not all predecessors ready yet
            }
        }

        // Daily-flagged preparation steps run at most once per worker
        // pool per calendar day; a repeat check inside the same day
        // no-ops at the instant it would otherwise have started, freeing
        // its successors without touching the ledger.
        if task.kind == TaskKind::Preparation && task.daily {
            if let Some(pool) = task.worker_pool.as_deref() {
                if self.daily_prep_done.contains(&(pool.to_string(), earliest.date())) {
                    self.started.insert(key);
                    self.started_at.insert(key, earliest);
                    self.pending_reason.insert(key, WaitReason::DailyPrepSkipped);
                    self.queue.push(
                        earliest,
                        EventKind::Start {
                            task: task_id,
                            unit,
                            iteration,
                        },
                    );
                    self.queue.push(
                        earliest,
                        EventKind::Complete {
                            task: task_id,
                            unit,
                            iteration,
                        },
                    );
                    return Ok(());
                }
            }
        }

        let mut resource_ready_at = earliest;
        if task.requires_worker() {
            let pool = task.worker_pool.as_deref().unwrap();
            let at = self.ledger.earliest_available(task_id, pool, task.workers_required, resource_ready_at)?;
            if at > resource_ready_at {
                resource_ready_at = at;
                reason = if self.reassignment_landings.contains(&(pool.to_string(), at)) {
                    WaitReason::ReassignmentDeferred
                } else {
                    WaitReason::WaitedOnWorker
                };
            }
        }
        if task.requires_machine() {
            let pool = task.machine_pool.as_deref().unwrap();
            let at = self.ledger.earliest_available(task_id, pool, 1, resource_ready_at)?;
            if at > resource_ready_at {
                resource_ready_at = at;
                reason = if self.reassignment_landings.contains(&(pool.to_string(), at)) {
                    WaitReason::ReassignmentDeferred
                } else {
                    WaitReason::WaitedOnMachine
                };
            }
        }

        let (start_at, end_at) = self.flow.calendar.advance(resource_ready_at, task.duration)?;
        if start_at > resource_ready_at {
            reason = WaitReason::WaitedOnCalendar;
        }

        self.started.insert(key);
        self.started_at.insert(key, start_at);

        if task.requires_worker() {
            let pool = task.worker_pool.as_deref().unwrap();
            self.ledger.reserve(pool, start_at, end_at, task.workers_required);
            if task.kind == TaskKind::Preparation && task.daily {
                self.daily_prep_done.insert((pool.to_string(), start_at.date()));
            }
        }
        if task.requires_machine() {
            let pool = task.machine_pool.as_deref().unwrap();
            self.ledger.reserve(pool, start_at, end_at, 1);
        }

        let landings = ReassignmentController::on_task_start(self.flow, &mut self.ledger, task_id, start_at)?;
        self.record_landings(landings);

        self.queue.push(
            start_at,
            EventKind::Start {
                task: task_id,
                unit,
                iteration,
            },
        );
        self.queue.push(
            end_at,
            EventKind::Complete {
                task: task_id,
                unit,
                iteration,
            },
        );

        self.pending_reason.insert(key, reason);
        Ok(())
    }

    fn record_landings(&mut self, landings: Vec<DeferredLanding>) {
        for landing in landings {
            self.reassignment_landings.insert((landing.pool, landing.at));
        }
    }

    fn record_completion(
        &mut self,
        task: &TaskDefinition,
        task_id: TaskId,
        unit: UnitIndex,
        iteration: IterationIndex,
        start: NaiveDateTime,
        end: NaiveDateTime,
        reason: WaitReason,
    ) -> Result<(), SchedulerError> {
        self.completed_at.insert((task_id, unit, iteration), end);
        self.trace.record(TraceEntry {
            task: task_id,
            task_name: task.name.clone(),
            unit,
            iteration,
            start,
            end,
            worker_pool: task.worker_pool.clone(),
            machine_pool: task.machine_pool.clone(),
            cycle_group: task.cycle_group.clone(),
            reason,
        });
        Ok(())
    }

    fn handle_complete(
        &mut self,
        task_id: TaskId,
        unit: UnitIndex,
        iteration: IterationIndex,
        at: NaiveDateTime,
    ) -> Result<(), SchedulerError> {
        let task = self.flow.task(task_id).ok_or(SchedulerError::UnknownTask(task_id))?.clone();
        let key = (task_id, unit, iteration);
        let start_at = *self.started_at.get(&key).unwrap_or(&at);
        let reason = self.pending_reason.remove(&key).unwrap_or(WaitReason::WaitedOnPredecessor);

        self.record_completion(&task, task_id, unit, iteration, start_at, at, reason)?;

        if task.requires_worker() {
            self.queue.push(
                at,
                EventKind::ResourceFree {
                    pool: task.worker_pool.clone().unwrap(),
                },
            );
        }
        if task.requires_machine() {
            self.queue.push(
                at,
                EventKind::ResourceFree {
                    pool: task.machine_pool.clone().unwrap(),
                },
            );
        }

        if let Some(group_id) = &task.cycle_group {
            let group = self.flow.cycle_group(group_id).cloned();
            if let Some(group) = group {
                if task.is_feeder {
                    self.cycle_ctl.on_feeder_complete(unit, group_id);
                }
                if task.cycle_role == CycleRole::Tail {
                    self.close_or_reopen_cycle(&group, unit, at)?;
                }
            }
        }

        let landings = ReassignmentController::on_task_complete(self.flow, &mut self.ledger, task_id, at)?;
        self.record_landings(landings);

        let mut successors: Vec<TaskId> = self.flow.ordinary_successors(task_id).collect();
        successors.sort_by_key(|id| self.flow.task(*id).map(|t| t.declared_order).unwrap_or(u32::MAX));
        for successor in successors {
            self.queue.push(
                at,
                EventKind::ReadyCheck {
                    task: successor,
                    unit,
                    iteration: IterationIndex::NONE,
                },
            );
        }

        Ok(())
    }

    /// Cycle-group-specific handling of a tail completion: decides
    /// whether the group opens another iteration or closes, updates the
    /// group's status before any generic successor propagation runs (so a
    /// closing iteration's external successor sees the group already
    /// closed), and — only for the special tail-to-head back-edge, which
    /// is a Cyclic edge and therefore invisible to generic ordinary
    /// successor propagation — pushes the head's ReadyCheck directly.
    fn close_or_reopen_cycle(&mut self, group: &CycleGroup, unit: UnitIndex, at: NaiveDateTime) -> Result<(), SchedulerError> {
        self.last_tail_completion.insert((unit, group.id.clone()), at);
        let status = self.cycle_ctl.on_tail_complete(unit, group);

        if status == CycleStatus::Open {
            let new_iteration = self.cycle_ctl.current_iteration(unit, &group.id);
            self.head_reiteration_floor.insert((group.head, unit, new_iteration), at);
            let landings = ReassignmentController::on_iteration(self.flow, &mut self.ledger, &group.id, new_iteration, at)?;
            self.record_landings(landings);
            self.queue.push(
                at,
                EventKind::ReadyCheck {
                    task: group.head,
                    unit,
                    iteration: IterationIndex::NONE,
                },
            );
        }

        Ok(())
    }

    /// Every task must have started for every unit by the time the event
    /// queue drains, or it never had — and never will have — a
    /// satisfiable combination of predecessors, cycle state and
    /// resources. Collects every such task across every unit rather than
    /// failing on the first, so a caller sees the whole blocked set.
    fn check_deadlock(&self) -> Result<(), SchedulerError> {
        let mut blocking: Vec<TaskId> = Vec::new();
        for unit_idx in 0..self.unit_count {
            let unit = UnitIndex(unit_idx);
            for task in &self.flow.tasks {
                let started_for_unit = self.started.iter().any(|(t, u, _)| *t == task.id && *u == unit);
                if !started_for_unit {
                    blocking.push(task.id);
                }
            }
        }
        blocking.sort();
        blocking.dedup();
        if blocking.is_empty() {
            Ok(())
        } else {
            Err(SchedulerError::DeadlockDetected { blocking })
        }
    }

    fn into_result(self) -> SimulationResult {
        let trace = self.trace.sorted();
        let makespan = trace.makespan();
        SimulationResult {
            trace,
            makespan,
            units_simulated: self.unit_count,
        }
    }
}
