//! Flow structural validation service
//!
//! Builds a petgraph `DiGraph` over ordinary edges only and runs
//! `toposort` on it, the same technique the original dependency analyzer
//! used to confirm a job graph had no accidental cycles. Declared Cyclic
//! edges are checked separately: each must close exactly the head/tail
//! pair of a declared cycle group, and the group's members must form one
//! unbranched chain from head to tail.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::domain::entities::{CycleBound, EdgeKind, Flow};
use crate::domain::value_objects::TaskId;
use crate::errors::SchedulerError;

pub struct FlowValidator;

impl FlowValidator {
    pub fn validate(flow: &Flow) -> Result<(), SchedulerError> {
        if flow.tasks.is_empty() {
            return Err(SchedulerError::EmptyFlow);
        }

        let known: HashSet<TaskId> = flow.tasks.iter().map(|t| t.id).collect();
        for dep in &flow.dependencies {
            if !known.contains(&dep.from) {
                return Err(SchedulerError::UnknownTask(dep.from));
            }
            if !known.contains(&dep.to) {
                return Err(SchedulerError::UnknownTask(dep.to));
            }
            if dep.from == dep.to {
                return Err(SchedulerError::SelfDependency(dep.from));
            }
        }

        Self::check_acyclic_excluding_declared_cycles(flow)?;
        Self::check_declared_cycles(flow)?;
        Self::check_no_undeclared_back_edges(flow)?;
        Self::check_sequential_groups(flow)?;
        Self::check_reachability(flow)?;

        Ok(())
    }

    /// Boundary case from spec §1/§8: a flow with no root (every task has
    /// an ordinary predecessor) and no task that can start without one —
    /// manual-trigger, auto-on-event, or `TaskKind::AutoTriggered` — has
    /// no possible entry point and is rejected outright rather than
    /// quietly deadlocking once the simulator runs.
    fn check_reachability(flow: &Flow) -> Result<(), SchedulerError> {
        let has_root = flow
            .tasks
            .iter()
            .any(|t| flow.ordinary_predecessors(t.id).next().is_none());
        if has_root {
            return Ok(());
        }
        let has_external_entry = flow.tasks.iter().any(|t| t.declares_auto_trigger());
        if has_external_entry {
            return Ok(());
        }
        Err(SchedulerError::NoReachableRoot)
    }

    /// A task is classified auto-triggered iff its start condition says
    /// so outright, or all of its predecessors sit inside the same cycle
    /// group and at least one of them is a feeder (§4.2's second clause).
    pub fn classify_auto_triggered(flow: &Flow) -> HashSet<TaskId> {
        let mut classified = HashSet::new();
        for task in &flow.tasks {
            if task.declares_auto_trigger() {
                classified.insert(task.id);
                continue;
            }
            let mut preds = flow.ordinary_predecessors(task.id).peekable();
            if preds.peek().is_none() {
                continue;
            }
            let all_in_same_group = preds.clone().all(|p| {
                flow.task(p)
                    .map(|pt| pt.cycle_group == task.cycle_group && task.cycle_group.is_some())
                    .unwrap_or(false)
            });
            let any_feeder = preds.clone().any(|p| flow.task(p).map(|pt| pt.is_feeder).unwrap_or(false));
            if all_in_same_group && any_feeder {
                classified.insert(task.id);
            }
        }
        classified
    }

    /// Every `group_key` must form one unbranched chain: exactly one
    /// member with no in-group ordinary predecessor, exactly one with no
    /// in-group ordinary successor, every other member exactly one of
    /// each — the same shape the cycle-group chain check below enforces.
    fn check_sequential_groups(flow: &Flow) -> Result<(), SchedulerError> {
        for key in flow.sequential_group_keys() {
            let members = flow.sequential_group_members(&key);
            if members.len() < 2 {
                continue;
            }
            let member_set: HashSet<TaskId> = members.iter().copied().collect();

            let mut entries = 0;
            let mut exits = 0;
            for &member in &members {
                let internal_successors = flow.ordinary_successors(member).filter(|s| member_set.contains(s)).count();
                let internal_predecessors = flow.ordinary_predecessors(member).filter(|p| member_set.contains(p)).count();
                if internal_predecessors == 0 {
                    entries += 1;
                } else if internal_predecessors != 1 {
                    return Err(SchedulerError::MalformedSequentialGroup {
                        group: key.clone(),
                        detail: format!("{member} has more than one in-group predecessor"),
                    });
                }
                if internal_successors == 0 {
                    exits += 1;
                } else if internal_successors != 1 {
                    return Err(SchedulerError::MalformedSequentialGroup {
                        group: key.clone(),
                        detail: format!("{member} has more than one in-group successor"),
                    });
                }
            }
            if entries != 1 || exits != 1 {
                return Err(SchedulerError::MalformedSequentialGroup {
                    group: key.clone(),
                    detail: format!("expected a single entry and exit, found {entries} entries and {exits} exits"),
                });
            }
        }
        Ok(())
    }

    fn check_acyclic_excluding_declared_cycles(flow: &Flow) -> Result<(), SchedulerError> {
        let mut graph = DiGraph::<TaskId, ()>::new();
        let mut index_of = HashMap::new();
        for task in &flow.tasks {
            let idx = graph.add_node(task.id);
            index_of.insert(task.id, idx);
        }
        for dep in &flow.dependencies {
            if dep.kind == EdgeKind::Ordinary {
                graph.add_edge(index_of[&dep.from], index_of[&dep.to], ());
            }
        }
        match toposort(&graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let offending = graph[cycle.node_id()];
                Err(SchedulerError::UnexpectedCycle(vec![offending]))
            }
        }
    }

    fn check_declared_cycles(flow: &Flow) -> Result<(), SchedulerError> {
        for group in &flow.cycle_groups {
            let members = flow.group_members(&group.id);
            if members.is_empty() {
                return Err(SchedulerError::MalformedCycleGroup {
                    group: group.id.to_string(),
                    detail: "no tasks declare membership".to_string(),
                });
            }
            if !members.contains(&group.head) || !members.contains(&group.tail) {
                return Err(SchedulerError::MalformedCycleGroup {
                    group: group.id.to_string(),
                    detail: "head or tail is not a member of its own group".to_string(),
                });
            }

            let back_edge_exists = flow.dependencies.iter().any(|d| {
                d.kind == EdgeKind::Cyclic && d.from == group.tail && d.to == group.head
            });
            if !back_edge_exists {
                return Err(SchedulerError::MalformedCycleGroup {
                    group: group.id.to_string(),
                    detail: "no Cyclic edge from tail to head".to_string(),
                });
            }

            // The ordinary edges among members, head to tail, must form a
            // single chain: every member other than the tail has exactly
            // one ordinary successor inside the group, and every member
            // other than the head has exactly one ordinary predecessor
            // inside the group.
            let member_set: HashSet<TaskId> = members.iter().copied().collect();
            for &member in &members {
                let internal_successors = flow
                    .ordinary_successors(member)
                    .filter(|s| member_set.contains(s))
                    .count();
                let internal_predecessors = flow
                    .ordinary_predecessors(member)
                    .filter(|p| member_set.contains(p))
                    .count();
                if member != group.tail && internal_successors != 1 {
                    return Err(SchedulerError::MalformedCycleGroup {
                        group: group.id.to_string(),
                        detail: format!("{} does not have exactly one in-group successor", member),
                    });
                }
                if member != group.head && internal_predecessors != 1 {
                    return Err(SchedulerError::MalformedCycleGroup {
                        group: group.id.to_string(),
                        detail: format!("{} does not have exactly one in-group predecessor", member),
                    });
                }
            }

            if matches!(group.bound, CycleBound::UntilFeederComplete) {
                let has_feeder = members.iter().any(|id| flow.task(*id).map(|t| t.is_feeder).unwrap_or(false));
                if !has_feeder {
                    return Err(SchedulerError::MalformedCycleGroup {
                        group: group.id.to_string(),
                        detail: "UntilFeederComplete bound but no member is flagged as a feeder".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_no_undeclared_back_edges(flow: &Flow) -> Result<(), SchedulerError> {
        for dep in &flow.dependencies {
            if dep.kind != EdgeKind::Cyclic {
                continue;
            }
            let declared = flow
                .cycle_groups
                .iter()
                .any(|g| g.tail == dep.from && g.head == dep.to);
            if !declared {
                return Err(SchedulerError::UndeclaredCycle(dep.from));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Calendar, Dependency, TaskDefinition};
    use crate::domain::entities::task::CycleRole;
    use crate::domain::value_objects::Minutes;
    use chrono::NaiveTime;

    fn simple_task(id: u32, order: u32) -> TaskDefinition {
        TaskDefinition {
            id: TaskId(id),
            name: format!("task-{id}"),
            duration: Minutes(10),
            kind: crate::domain::entities::task::TaskKind::Ordinary,
            start_condition: crate::domain::entities::task::StartCondition::AfterPredecessors,
            worker_pool: None,
            workers_required: 0,
            machine_pool: None,
            daily: false,
            cycle_role: CycleRole::None,
            cycle_group: None,
            is_feeder: false,
            group_key: None,
            group_position: None,
            declared_order: order,
        }
    }

    fn calendar() -> Calendar {
        Calendar::weekdays_9_to_5(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )
    }

    #[test]
    fn linear_chain_is_valid() {
        let flow = Flow {
            name: "linear".into(),
            tasks: vec![simple_task(0, 0), simple_task(1, 1), simple_task(2, 2)],
            dependencies: vec![
                Dependency::ordinary(TaskId(0), TaskId(1)),
                Dependency::ordinary(TaskId(1), TaskId(2)),
            ],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        assert!(FlowValidator::validate(&flow).is_ok());
    }

    #[test]
    fn undeclared_cycle_is_rejected() {
        let flow = Flow {
            name: "loop".into(),
            tasks: vec![simple_task(0, 0), simple_task(1, 1)],
            dependencies: vec![
                Dependency::ordinary(TaskId(0), TaskId(1)),
                Dependency::ordinary(TaskId(1), TaskId(0)),
            ],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        assert!(matches!(
            FlowValidator::validate(&flow),
            Err(SchedulerError::UnexpectedCycle(_))
        ));
    }

    #[test]
    fn unknown_task_reference_is_rejected() {
        let flow = Flow {
            name: "dangling".into(),
            tasks: vec![simple_task(0, 0)],
            dependencies: vec![Dependency::ordinary(TaskId(0), TaskId(99))],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        assert!(matches!(
            FlowValidator::validate(&flow),
            Err(SchedulerError::UnknownTask(_))
        ));
    }

    #[test]
    fn flow_with_only_auto_triggered_tasks_and_no_root_is_invalid() {
        let mut t = simple_task(0, 0);
        t.cycle_group = Some(crate::domain::value_objects::CycleGroupId::from("qc"));
        let mut t2 = simple_task(1, 1);
        t2.cycle_group = Some(crate::domain::value_objects::CycleGroupId::from("qc"));
        let flow = Flow {
            name: "no-root".into(),
            tasks: vec![t, t2],
            dependencies: vec![
                Dependency::ordinary(TaskId(0), TaskId(1)),
                Dependency::ordinary(TaskId(1), TaskId(0)),
            ],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        // Every task has an ordinary predecessor and none is auto-triggered.
        assert!(matches!(
            FlowValidator::validate(&flow),
            Err(SchedulerError::UnexpectedCycle(_)) | Err(SchedulerError::NoReachableRoot)
        ));
    }

    #[test]
    fn sequential_group_with_two_entries_is_rejected() {
        let mut a = simple_task(0, 0);
        a.group_key = Some("packing-bench".into());
        a.group_position = Some(0);
        let mut b = simple_task(1, 1);
        b.group_key = Some("packing-bench".into());
        b.group_position = Some(1);
        let mut c = simple_task(2, 2);
        c.group_key = Some("packing-bench".into());
        c.group_position = Some(1);

        let flow = Flow {
            name: "branching-group".into(),
            tasks: vec![a, b, c],
            dependencies: vec![],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        assert!(matches!(
            FlowValidator::validate(&flow),
            Err(SchedulerError::MalformedSequentialGroup { .. })
        ));
    }

    #[test]
    fn sequential_group_linear_chain_is_valid() {
        let mut a = simple_task(0, 0);
        a.group_key = Some("packing-bench".into());
        a.group_position = Some(0);
        let mut b = simple_task(1, 1);
        b.group_key = Some("packing-bench".into());
        b.group_position = Some(1);

        let flow = Flow {
            name: "linear-group".into(),
            tasks: vec![a, b],
            dependencies: vec![Dependency::ordinary(TaskId(0), TaskId(1))],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        assert!(FlowValidator::validate(&flow).is_ok());
    }

    #[test]
    fn classify_auto_triggered_marks_in_group_feeder_successors() {
        use crate::domain::value_objects::CycleGroupId;

        let mut feeder = simple_task(0, 0);
        feeder.is_feeder = true;

        let mut head = simple_task(1, 1);
        head.cycle_group = Some(CycleGroupId::from("qc"));
        head.cycle_role = CycleRole::Head;

        let flow = Flow {
            name: "feeder".into(),
            tasks: vec![feeder, head],
            dependencies: vec![Dependency::ordinary(TaskId(0), TaskId(1))],
            cycle_groups: vec![],
            resource_pools: vec![],
            reassignment_policies: vec![],
            calendar: calendar(),
        };
        // `head`'s only predecessor is an external feeder, not inside its
        // own cycle group, so it is NOT classified auto-triggered by the
        // in-group-feeder rule.
        let classified = FlowValidator::classify_auto_triggered(&flow);
        assert!(!classified.contains(&TaskId(1)));
    }
}
