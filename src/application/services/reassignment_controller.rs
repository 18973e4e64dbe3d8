//! Worker reassignment controller
//!
//! Applies `ReassignmentPolicy` triggers against a `ResourceLedger`. A
//! reassignment whose source pool has no idle capacity at trigger time is
//! deferred to the moment it does. Moving staff into a target pool with
//! zero base capacity is the normal case this feature exists for; a
//! policy is only ever suppressed when it opts into the
//! `only_if_target_not_staffed` condition and the target already has an
//! active reservation at the trigger instant.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::entities::{Flow, ReassignmentPolicy, ReassignmentTrigger, ResourceLedger};
use crate::domain::value_objects::{CycleGroupId, IterationIndex, TaskId};
use crate::errors::SchedulerError;

/// Records the landing instant of a reassignment whose effective time was
/// pushed past its trigger time because the source pool was still busy.
/// The simulator uses these to attribute a task's wait to
/// `WaitReason::ReassignmentDeferred` rather than a plain worker/machine
/// wait when the two coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredLanding {
    pub pool: String,
    pub at: NaiveDateTime,
}

pub struct ReassignmentController;

impl ReassignmentController {
    pub fn on_task_start(
        flow: &Flow,
        ledger: &mut ResourceLedger,
        task: TaskId,
        at: NaiveDateTime,
    ) -> Result<Vec<DeferredLanding>, SchedulerError> {
        let mut landings = Vec::new();
        for policy in flow.reassignment_policies.iter() {
            if matches!(&policy.trigger, ReassignmentTrigger::OnStart(t) if *t == task) {
                if let Some(landing) = Self::apply(flow, ledger, policy, at)? {
                    landings.push(landing);
                }
            }
        }
        Ok(landings)
    }

    pub fn on_task_complete(
        flow: &Flow,
        ledger: &mut ResourceLedger,
        task: TaskId,
        at: NaiveDateTime,
    ) -> Result<Vec<DeferredLanding>, SchedulerError> {
        let mut landings = Vec::new();
        for policy in flow.reassignment_policies.iter() {
            if matches!(&policy.trigger, ReassignmentTrigger::OnComplete(t) if *t == task) {
                if let Some(landing) = Self::apply(flow, ledger, policy, at)? {
                    landings.push(landing);
                }
            }
        }
        Ok(landings)
    }

    pub fn on_iteration(
        flow: &Flow,
        ledger: &mut ResourceLedger,
        group: &CycleGroupId,
        iteration: IterationIndex,
        at: NaiveDateTime,
    ) -> Result<Vec<DeferredLanding>, SchedulerError> {
        let mut landings = Vec::new();
        for policy in flow.reassignment_policies.iter() {
            if matches!(&policy.trigger, ReassignmentTrigger::OnIteration(g, k) if g == group && *k == iteration)
            {
                if let Some(landing) = Self::apply(flow, ledger, policy, at)? {
                    landings.push(landing);
                }
            }
        }
        Ok(landings)
    }

    fn apply(
        _flow: &Flow,
        ledger: &mut ResourceLedger,
        policy: &ReassignmentPolicy,
        at: NaiveDateTime,
    ) -> Result<Option<DeferredLanding>, SchedulerError> {
        if policy.only_if_target_not_staffed && ledger.active_units(&policy.to_pool, at) > 0 {
            debug!(policy = %policy.id, "suppressing reassignment: target pool already staffed");
            return Ok(None);
        }

        let effective_at = ledger.earliest_available(
            TaskId(0),
            &policy.from_pool,
            policy.units,
            at,
        )?;
        let deferred = if effective_at != at {
            debug!(policy = %policy.id, deferred_to = %effective_at, "deferring reassignment until source pool is idle");
            Some(DeferredLanding {
                pool: policy.to_pool.clone(),
                at: effective_at,
            })
        } else {
            None
        };
        ledger.reassign(&policy.from_pool, &policy.to_pool, effective_at, policy.units);
        Ok(deferred)
    }
}
