//! Report DTOs for the CLI's JSON output
//!
//! Thin, serialization-friendly shadows of the application layer's result
//! types, the same role the original `AnalysisOutput` DTO played: keep
//! the wire format stable and human-readable independent of how the
//! domain types evolve internally.

use std::collections::HashMap;

use serde::Serialize;

use crate::application::services::{TraceEntry, WaitReason};
use crate::application::use_cases::{OptimiserResult, SimulationResult};
use crate::domain::entities::Flow;

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub flow_name: String,
    pub valid: bool,
    pub task_count: usize,
    pub dependency_count: usize,
    pub cycle_group_count: usize,
    pub resource_pool_count: usize,
}

impl ValidationReport {
    pub fn for_flow(flow: &Flow, valid: bool) -> Self {
        Self {
            flow_name: flow.name.clone(),
            valid,
            task_count: flow.tasks.len(),
            dependency_count: flow.dependencies.len(),
            cycle_group_count: flow.cycle_groups.len(),
            resource_pool_count: flow.resource_pools.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TraceEntryDto {
    pub task: String,
    pub unit: u32,
    pub iteration: u32,
    pub start: String,
    pub end: String,
    pub worker_pool: Option<String>,
    pub machine_pool: Option<String>,
    pub cycle_group: Option<String>,
    pub reason: WaitReason,
}

impl From<&TraceEntry> for TraceEntryDto {
    fn from(entry: &TraceEntry) -> Self {
        Self {
            task: entry.task_name.clone(),
            unit: entry.unit.0,
            iteration: entry.iteration.0,
            start: entry.start.to_string(),
            end: entry.end.to_string(),
            worker_pool: entry.worker_pool.clone(),
            machine_pool: entry.machine_pool.clone(),
            cycle_group: entry.cycle_group.as_ref().map(|g| g.to_string()),
            reason: entry.reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub flow_name: String,
    pub units_simulated: u32,
    pub makespan_minutes: u32,
    pub bottleneck_pool: Option<String>,
    pub entries: Vec<TraceEntryDto>,
}

impl SimulationReport {
    pub fn new(flow_name: &str, result: &SimulationResult) -> Self {
        Self {
            flow_name: flow_name.to_string(),
            units_simulated: result.units_simulated,
            makespan_minutes: result.makespan.value(),
            bottleneck_pool: result.bottleneck_pool(),
            entries: result.trace.entries().iter().map(TraceEntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptimiserReport {
    pub flow_name: String,
    pub capacities: HashMap<String, u32>,
    pub makespan_minutes: u32,
    pub trials: u32,
}

impl OptimiserReport {
    pub fn new(flow_name: &str, result: &OptimiserResult) -> Self {
        Self {
            flow_name: flow_name.to_string(),
            capacities: result.capacities.clone(),
            makespan_minutes: result.makespan.value(),
            trials: result.trials,
        }
    }
}
