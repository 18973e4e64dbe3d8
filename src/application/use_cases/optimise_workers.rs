//! Deadline optimiser use case
//!
//! Finds the smallest staffing level per resource pool that still meets a
//! target makespan. Exploits the assumption that adding workers to a pool
//! never makes the makespan worse: each pool is binary-searched
//! independently for its minimal sufficient capacity, and the pools are
//! swept in coordinate-descent rounds until a full round changes nothing.
//! Every trial's makespan is cached by its capacity vector so a repeated
//! combination (binary search revisits midpoints across rounds) never
//! re-runs the simulation.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::application::use_cases::expand_lots::Demand;
use crate::application::use_cases::simulate_flow::SimulateFlow;
use crate::domain::entities::Flow;
use crate::domain::value_objects::Minutes;
use crate::errors::SchedulerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimiserRequest {
    pub pools: Vec<String>,
    pub min_capacity: u32,
    pub max_capacity: u32,
    pub deadline: Minutes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimiserResult {
    pub capacities: HashMap<String, u32>,
    pub makespan: Minutes,
    pub trials: u32,
}

/// Receives one notification per simulated trial. The CLI implementation
/// drives an indicatif bar from this; tests can use a no-op sink.
pub trait ProgressSink {
    fn on_trial(&mut self, trial: u32, capacities: &HashMap<String, u32>, makespan: Minutes);
}

pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_trial(&mut self, _trial: u32, _capacities: &HashMap<String, u32>, _makespan: Minutes) {}
}

/// Drives an indicatif spinner, the same progress-reporting crate the
/// original CLI used for long-running analysis passes.
pub struct IndicatifProgressSink {
    bar: ProgressBar,
}

impl IndicatifProgressSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} optimising... {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl Default for IndicatifProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for IndicatifProgressSink {
    fn on_trial(&mut self, trial: u32, capacities: &HashMap<String, u32>, makespan: Minutes) {
        self.bar.set_message(format!("trial {trial}: {capacities:?} -> {makespan}"));
        self.bar.tick();
    }
}

pub struct OptimiseWorkers;

impl OptimiseWorkers {
    pub fn optimise(
        flow: &Flow,
        demand: &Demand,
        start: NaiveDateTime,
        request: &OptimiserRequest,
        progress: &mut dyn ProgressSink,
        cancelled: &dyn Fn() -> bool,
    ) -> Result<OptimiserResult, SchedulerError> {
        if request.pools.is_empty() {
            return Err(SchedulerError::InvalidOptimiserRequest(
                "no resource pools named to search over".to_string(),
            ));
        }
        if request.min_capacity > request.max_capacity {
            return Err(SchedulerError::InvalidOptimiserRequest(
                "min_capacity exceeds max_capacity".to_string(),
            ));
        }
        for pool in &request.pools {
            if flow.resource_pool(pool).is_none() {
                return Err(SchedulerError::UnknownResourcePool(pool.clone()));
            }
        }

        let mut cache: HashMap<Vec<u32>, Minutes> = HashMap::new();
        let mut trials = 0u32;
        let mut capacities: HashMap<String, u32> = request
            .pools
            .iter()
            .map(|p| (p.clone(), request.max_capacity))
            .collect();

        let ceiling = Self::makespan_for(flow, demand, start, &request.pools, &capacities, &mut cache, &mut trials, progress)?;
        if ceiling.value() > request.deadline.value() {
            return Err(SchedulerError::DeadlineUnreachable);
        }

        let mut changed = true;
        while changed {
            changed = false;
            for pool in &request.pools {
                if cancelled() {
                    return Err(SchedulerError::Cancelled);
                }

                let mut lo = request.min_capacity;
                let mut hi = capacities[pool];
                while lo < hi {
                    let mid = lo + (hi - lo) / 2;
                    let mut trial = capacities.clone();
                    trial.insert(pool.clone(), mid);
                    let makespan = Self::makespan_for(flow, demand, start, &request.pools, &trial, &mut cache, &mut trials, progress)?;
                    if makespan.value() <= request.deadline.value() {
                        hi = mid;
                    } else {
                        lo = mid + 1;
                    }
                }

                if hi != capacities[pool] {
                    capacities.insert(pool.clone(), hi);
                    changed = true;
                }
            }
        }

        let makespan = Self::makespan_for(flow, demand, start, &request.pools, &capacities, &mut cache, &mut trials, progress)?;
        Ok(OptimiserResult {
            capacities,
            makespan,
            trials,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn makespan_for(
        flow: &Flow,
        demand: &Demand,
        start: NaiveDateTime,
        pools: &[String],
        capacities: &HashMap<String, u32>,
        cache: &mut HashMap<Vec<u32>, Minutes>,
        trials: &mut u32,
        progress: &mut dyn ProgressSink,
    ) -> Result<Minutes, SchedulerError> {
        let key: Vec<u32> = pools.iter().map(|p| capacities[p]).collect();
        if let Some(makespan) = cache.get(&key) {
            return Ok(*makespan);
        }

        let mut trial_flow = flow.clone();
        for pool in trial_flow.resource_pools.iter_mut() {
            if let Some(c) = capacities.get(&pool.id) {
                pool.capacity = *c;
            }
        }

        let result = SimulateFlow::run(&trial_flow, demand, start)?;
        *trials += 1;
        progress.on_trial(*trials, capacities, result.makespan);
        cache.insert(key, result.makespan);
        Ok(result.makespan)
    }
}
