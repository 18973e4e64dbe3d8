//! Flow definition loader
//!
//! Parses a flow definition document (JSON) and resolves every name
//! reference — task names, cycle group ids, pool ids — into the
//! `TaskId`-indexed `Flow` the rest of the scheduler operates on. Mirrors
//! the original XML-to-domain conversion step, rebuilt around
//! `serde_json` instead of `roxmltree` since the input format here is
//! JSON, not Control-M's XML export.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::domain::entities::task::{CycleRole, StartCondition, TaskKind};
use crate::domain::entities::{
    BreakWindow, Calendar, CycleBound, CycleGroup, Dependency, EdgeKind, Flow, ReassignmentPolicy,
    ReassignmentTrigger, ResourcePool, ShiftWindow, TaskDefinition,
};
use crate::domain::value_objects::{CycleGroupId, IterationIndex, Minutes, TaskId};
use crate::errors::SchedulerError;
use crate::infrastructure::parsers::flow_definition_dto::{
    CalendarDto, CycleBoundDto, CycleRoleDto, DependencyDto, EdgeKindDto, FlowDefinitionDto, ReassignmentTriggerDto,
    StartConditionDto, TaskKindDto,
};

pub struct FlowDefinitionLoader;

impl FlowDefinitionLoader {
    pub fn load_str(raw: &str) -> Result<Flow, SchedulerError> {
        let dto: FlowDefinitionDto = serde_json::from_str(raw)?;
        Self::from_dto(dto)
    }

    pub fn from_dto(dto: FlowDefinitionDto) -> Result<Flow, SchedulerError> {
        let name_to_id: HashMap<String, TaskId> = dto
            .tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), TaskId(i as u32)))
            .collect();

        let resolve = |name: &str| -> Result<TaskId, SchedulerError> {
            name_to_id
                .get(name)
                .copied()
                .ok_or_else(|| SchedulerError::ParseError(format!("unknown task name '{name}'")))
        };

        let tasks = dto
            .tasks
            .iter()
            .enumerate()
            .map(|(order, t)| {
                Ok(TaskDefinition {
                    id: name_to_id[&t.name],
                    name: t.name.clone(),
                    duration: Minutes(t.duration_minutes),
                    kind: match t.kind {
                        Some(TaskKindDto::Ordinary) | None => TaskKind::Ordinary,
                        Some(TaskKindDto::Preparation) => TaskKind::Preparation,
                        Some(TaskKindDto::MechanicalProcess) => TaskKind::MechanicalProcess,
                        Some(TaskKindDto::AutoTriggered) => TaskKind::AutoTriggered,
                    },
                    start_condition: match t.start_condition {
                        Some(StartConditionDto::AfterPredecessors) | None => StartCondition::AfterPredecessors,
                        Some(StartConditionDto::ManualTrigger) => StartCondition::ManualTrigger,
                        Some(StartConditionDto::AutoOnEvent) => StartCondition::AutoOnEvent,
                    },
                    worker_pool: t.worker_pool.clone(),
                    workers_required: t.workers_required,
                    machine_pool: t.machine_pool.clone(),
                    daily: t.daily,
                    cycle_role: match t.cycle_role {
                        Some(CycleRoleDto::Head) => CycleRole::Head,
                        Some(CycleRoleDto::Body) => CycleRole::Body,
                        Some(CycleRoleDto::Tail) => CycleRole::Tail,
                        None => CycleRole::None,
                    },
                    cycle_group: t.cycle_group.clone().map(CycleGroupId::from),
                    is_feeder: t.is_feeder,
                    group_key: t.group_key.clone(),
                    group_position: t.group_position,
                    declared_order: order as u32,
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let dependencies = dto
            .dependencies
            .iter()
            .map(|d: &DependencyDto| {
                let from = resolve(&d.from)?;
                let to = resolve(&d.to)?;
                Ok(Dependency {
                    from,
                    to,
                    kind: match d.kind {
                        EdgeKindDto::Ordinary => EdgeKind::Ordinary,
                        EdgeKindDto::Cyclic => EdgeKind::Cyclic,
                    },
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let cycle_groups = dto
            .cycle_groups
            .iter()
            .map(|g| {
                Ok(CycleGroup {
                    id: CycleGroupId::from(g.id.clone()),
                    head: resolve(&g.head)?,
                    tail: resolve(&g.tail)?,
                    bound: match &g.bound {
                        CycleBoundDto::Fixed { iterations } => CycleBound::Fixed(*iterations),
                        CycleBoundDto::UntilFeederComplete => CycleBound::UntilFeederComplete,
                    },
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let resource_pools = dto
            .resource_pools
            .iter()
            .map(|p| ResourcePool {
                id: p.id.clone(),
                capacity: p.capacity,
            })
            .collect();

        let reassignment_policies = dto
            .reassignment_policies
            .iter()
            .map(|p| {
                Ok(ReassignmentPolicy {
                    id: p.id.clone(),
                    trigger: match &p.trigger {
                        ReassignmentTriggerDto::Start { task } => ReassignmentTrigger::OnStart(resolve(task)?),
                        ReassignmentTriggerDto::Complete { task } => ReassignmentTrigger::OnComplete(resolve(task)?),
                        ReassignmentTriggerDto::Iteration { group, iteration } => {
                            ReassignmentTrigger::OnIteration(CycleGroupId::from(group.clone()), IterationIndex(*iteration))
                        }
                    },
                    from_pool: p.from_pool.clone(),
                    to_pool: p.to_pool.clone(),
                    units: p.units,
                    only_if_target_not_staffed: p.only_if_target_not_staffed,
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let calendar = Self::parse_calendar(&dto.calendar)?;

        Ok(Flow {
            name: dto.name,
            tasks,
            dependencies,
            cycle_groups,
            resource_pools,
            reassignment_policies,
            calendar,
        })
    }

    fn parse_calendar(dto: &CalendarDto) -> Result<Calendar, SchedulerError> {
        let weekdays: BTreeSet<Weekday> = dto
            .weekdays
            .iter()
            .map(|w| Self::parse_weekday(w))
            .collect::<Result<_, _>>()?;

        let shifts = dto
            .shifts
            .iter()
            .map(|s| {
                Ok(ShiftWindow {
                    start: Self::parse_time(&s.start)?,
                    end: Self::parse_time(&s.end)?,
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let breaks = dto
            .breaks
            .iter()
            .map(|b| {
                Ok(BreakWindow {
                    start: Self::parse_time(&b.start)?,
                    end: Self::parse_time(&b.end)?,
                })
            })
            .collect::<Result<Vec<_>, SchedulerError>>()?;

        let holidays = dto
            .holidays
            .iter()
            .map(|h| {
                NaiveDate::parse_from_str(h, "%Y-%m-%d")
                    .map_err(|e| SchedulerError::ParseError(format!("invalid holiday date '{h}': {e}")))
            })
            .collect::<Result<_, SchedulerError>>()?;

        Calendar::new(weekdays, shifts, breaks, holidays)
    }

    fn parse_time(raw: &str) -> Result<NaiveTime, SchedulerError> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|e| SchedulerError::ParseError(format!("invalid time '{raw}': {e}")))
    }

    fn parse_weekday(raw: &str) -> Result<Weekday, SchedulerError> {
        match raw.to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(Weekday::Mon),
            "tue" | "tuesday" => Ok(Weekday::Tue),
            "wed" | "wednesday" => Ok(Weekday::Wed),
            "thu" | "thursday" => Ok(Weekday::Thu),
            "fri" | "friday" => Ok(Weekday::Fri),
            "sat" | "saturday" => Ok(Weekday::Sat),
            "sun" | "sunday" => Ok(Weekday::Sun),
            other => Err(SchedulerError::ParseError(format!("unknown weekday '{other}'"))),
        }
    }
}
