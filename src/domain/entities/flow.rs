//! Flow aggregate entity module
//!
//! A Flow is the complete, validated definition of a production process:
//! its tasks, the dependency edges between them, the cycle groups those
//! back-edges close, the resource pools tasks draw from, the reassignment
//! policies that move capacity between pools, and the calendar duration
//! is measured against. It is the aggregate root the rest of the domain
//! and application layers operate on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::calendar::Calendar;
use crate::domain::entities::cycle::CycleGroup;
use crate::domain::entities::dependency::{Dependency, EdgeKind};
use crate::domain::entities::reassignment::ReassignmentPolicy;
use crate::domain::entities::resource::ResourcePool;
use crate::domain::entities::task::TaskDefinition;
use crate::domain::value_objects::{CycleGroupId, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,
    pub tasks: Vec<TaskDefinition>,
    pub dependencies: Vec<Dependency>,
    pub cycle_groups: Vec<CycleGroup>,
    pub resource_pools: Vec<ResourcePool>,
    pub reassignment_policies: Vec<ReassignmentPolicy>,
    pub calendar: Calendar,
}

impl Flow {
    pub fn task(&self, id: TaskId) -> Option<&TaskDefinition> {
        self.tasks.get(id.index())
    }

    pub fn ordinary_predecessors(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.dependencies
            .iter()
            .filter(move |d| d.to == id && d.kind == EdgeKind::Ordinary)
            .map(|d| d.from)
    }

    pub fn ordinary_successors(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.dependencies
            .iter()
            .filter(move |d| d.from == id && d.kind == EdgeKind::Ordinary)
            .map(|d| d.to)
    }

    /// The cycle group this task belongs to, if any.
    pub fn cycle_group_of(&self, id: TaskId) -> Option<&CycleGroup> {
        self.tasks
            .get(id.index())
            .and_then(|t| t.cycle_group.as_ref())
            .and_then(|group_id| self.cycle_group(group_id))
    }

    pub fn cycle_group(&self, id: &CycleGroupId) -> Option<&CycleGroup> {
        self.cycle_groups.iter().find(|g| &g.id == id)
    }

    /// Tasks whose `cycle_group` names `group_id`, in declared order.
    pub fn group_members(&self, group_id: &CycleGroupId) -> Vec<TaskId> {
        let mut members: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.cycle_group.as_ref() == Some(group_id))
            .map(|t| t.id)
            .collect();
        members.sort_by_key(|id| self.task(*id).map(|t| t.declared_order).unwrap_or(u32::MAX));
        members
    }

    pub fn resource_pool(&self, id: &str) -> Option<&ResourcePool> {
        self.resource_pools.iter().find(|p| p.id == id)
    }

    /// Every distinct `group_key` declared by at least one task.
    pub fn sequential_group_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .tasks
            .iter()
            .filter_map(|t| t.group_key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Tasks sharing `group_key`, ordered by `group_position` (ties
    /// broken by declared order since a malformed group may omit it).
    pub fn sequential_group_members(&self, group_key: &str) -> Vec<TaskId> {
        let mut members: Vec<&TaskDefinition> = self
            .tasks
            .iter()
            .filter(|t| t.group_key.as_deref() == Some(group_key))
            .collect();
        members.sort_by_key(|t| (t.group_position.unwrap_or(u32::MAX), t.declared_order));
        members.iter().map(|t| t.id).collect()
    }

    pub fn policies_triggered_by_start(&self, id: TaskId) -> impl Iterator<Item = &ReassignmentPolicy> {
        self.reassignment_policies.iter().filter(move |p| {
            matches!(&p.trigger, crate::domain::entities::reassignment::ReassignmentTrigger::OnStart(t) if *t == id)
        })
    }

    pub fn policies_triggered_by_complete(&self, id: TaskId) -> impl Iterator<Item = &ReassignmentPolicy> {
        self.reassignment_policies.iter().filter(move |p| {
            matches!(&p.trigger, crate::domain::entities::reassignment::ReassignmentTrigger::OnComplete(t) if *t == id)
        })
    }

    /// A lookup from declared order back to index, built once for the
    /// deterministic tie-break the simulator uses when enqueueing events.
    pub fn declared_order_index(&self) -> HashMap<TaskId, u32> {
        self.tasks.iter().map(|t| (t.id, t.declared_order)).collect()
    }
}
