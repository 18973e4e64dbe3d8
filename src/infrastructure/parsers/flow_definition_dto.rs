//! Flow definition DTOs
//!
//! The wire shape of a flow definition file: tasks, dependencies, cycle
//! groups and policies reference each other by name rather than by
//! `TaskId`, the same way the original Control-M job definitions
//! referenced jobs by name rather than by internal id. `FlowDefinitionLoader`
//! resolves these names into a validated `Flow`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDto {
    pub name: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub kind: Option<TaskKindDto>,
    #[serde(default)]
    pub start_condition: Option<StartConditionDto>,
    #[serde(default)]
    pub worker_pool: Option<String>,
    #[serde(default)]
    pub workers_required: u32,
    #[serde(default)]
    pub machine_pool: Option<String>,
    #[serde(default)]
    pub daily: bool,
    #[serde(default)]
    pub cycle_group: Option<String>,
    #[serde(default)]
    pub cycle_role: Option<CycleRoleDto>,
    #[serde(default)]
    pub is_feeder: bool,
    #[serde(default)]
    pub group_key: Option<String>,
    #[serde(default)]
    pub group_position: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRoleDto {
    Head,
    Body,
    Tail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKindDto {
    Ordinary,
    Preparation,
    MechanicalProcess,
    AutoTriggered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartConditionDto {
    AfterPredecessors,
    ManualTrigger,
    AutoOnEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKindDto {
    Ordinary,
    Cyclic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyDto {
    pub from: String,
    pub to: String,
    #[serde(default = "default_edge_kind")]
    pub kind: EdgeKindDto,
}

fn default_edge_kind() -> EdgeKindDto {
    EdgeKindDto::Ordinary
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleBoundDto {
    Fixed { iterations: u32 },
    UntilFeederComplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleGroupDto {
    pub id: String,
    pub head: String,
    pub tail: String,
    pub bound: CycleBoundDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePoolDto {
    pub id: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum ReassignmentTriggerDto {
    Start { task: String },
    Complete { task: String },
    Iteration { group: String, iteration: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignmentPolicyDto {
    pub id: String,
    pub trigger: ReassignmentTriggerDto,
    pub from_pool: String,
    pub to_pool: String,
    pub units: u32,
    #[serde(default)]
    pub only_if_target_not_staffed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftWindowDto {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarDto {
    pub weekdays: Vec<String>,
    pub shifts: Vec<ShiftWindowDto>,
    #[serde(default)]
    pub breaks: Vec<ShiftWindowDto>,
    #[serde(default)]
    pub holidays: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDefinitionDto {
    pub name: String,
    pub tasks: Vec<TaskDto>,
    #[serde(default)]
    pub dependencies: Vec<DependencyDto>,
    #[serde(default)]
    pub cycle_groups: Vec<CycleGroupDto>,
    #[serde(default)]
    pub resource_pools: Vec<ResourcePoolDto>,
    #[serde(default)]
    pub reassignment_policies: Vec<ReassignmentPolicyDto>,
    pub calendar: CalendarDto,
}
