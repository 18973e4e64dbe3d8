//! Resource pool and ledger entity module
//!
//! A ResourcePool is a named group of interchangeable workers or machines
//! with a base capacity. The ResourceLedger tracks every reservation made
//! against a pool plus every reassignment of capacity between pools, and
//! answers the one question the simulator actually needs: given a pool and
//! a number of units, what is the earliest instant at or after `not_before`
//! when that many units are free.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::TaskId;
use crate::errors::SchedulerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePool {
    pub id: String,
    pub capacity: u32,
}

#[derive(Debug, Clone)]
struct Reservation {
    start: NaiveDateTime,
    end: NaiveDateTime,
    units: u32,
}

/// A capacity reassignment: from `at` onward the pool's effective capacity
/// changes by `delta` (negative when units are moved out, positive when
/// moved in), until superseded by a later change.
#[derive(Debug, Clone)]
struct CapacityChange {
    at: NaiveDateTime,
    delta: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    base_capacity: HashMap<String, u32>,
    reservations: HashMap<String, Vec<Reservation>>,
    capacity_changes: HashMap<String, Vec<CapacityChange>>,
}

impl ResourceLedger {
    pub fn new(pools: impl IntoIterator<Item = ResourcePool>) -> Self {
        let mut base_capacity = HashMap::new();
        for pool in pools {
            base_capacity.insert(pool.id, pool.capacity);
        }
        Self {
            base_capacity,
            reservations: HashMap::new(),
            capacity_changes: HashMap::new(),
        }
    }

    fn effective_capacity(&self, pool_id: &str, at: NaiveDateTime) -> i64 {
        let base = *self.base_capacity.get(pool_id).unwrap_or(&0) as i64;
        let changes = self.capacity_changes.get(pool_id);
        let applied: i64 = changes
            .into_iter()
            .flatten()
            .filter(|c| c.at <= at)
            .map(|c| c.delta)
            .sum();
        base + applied
    }

    fn units_busy_at(&self, pool_id: &str, at: NaiveDateTime) -> u32 {
        self.reservations
            .get(pool_id)
            .into_iter()
            .flatten()
            .filter(|r| r.start <= at && at < r.end)
            .map(|r| r.units)
            .sum()
    }

    /// Units of `pool_id` with a reservation covering `at`. Used by the
    /// reassignment controller's "target not already staffed" check —
    /// pools are fungible here, so "staffed" means "has an active
    /// reservation", not "a specific worker is present".
    pub fn active_units(&self, pool_id: &str, at: NaiveDateTime) -> u32 {
        self.units_busy_at(pool_id, at)
    }

    /// Earliest instant at or after `not_before` at which `units_needed`
    /// units of `pool_id` are simultaneously free.
    pub fn earliest_available(
        &self,
        task: TaskId,
        pool_id: &str,
        units_needed: u32,
        not_before: NaiveDateTime,
    ) -> Result<NaiveDateTime, SchedulerError> {
        if !self.base_capacity.contains_key(pool_id) {
            return Err(SchedulerError::UnknownResourcePool(pool_id.to_string()));
        }

        let mut candidates = vec![not_before];
        if let Some(reservations) = self.reservations.get(pool_id) {
            for r in reservations {
                if r.end >= not_before {
                    candidates.push(r.end);
                }
            }
        }
        if let Some(changes) = self.capacity_changes.get(pool_id) {
            for c in changes {
                if c.at >= not_before {
                    candidates.push(c.at);
                }
            }
        }
        candidates.sort();
        candidates.dedup();

        for t in candidates {
            let capacity = self.effective_capacity(pool_id, t);
            if capacity < 0 {
                continue;
            }
            let busy = self.units_busy_at(pool_id, t) as i64;
            if capacity - busy >= units_needed as i64 {
                return Ok(t);
            }
        }

        let capacity_now = self.effective_capacity(pool_id, not_before).max(0) as u32;
        Err(SchedulerError::InsufficientStaffing(
            task,
            units_needed,
            capacity_now,
        ))
    }

    /// Reserves `units` of `pool_id` for `[start, end)`. Caller is
    /// responsible for first confirming availability via
    /// `earliest_available`.
    pub fn reserve(&mut self, pool_id: &str, start: NaiveDateTime, end: NaiveDateTime, units: u32) {
        self.reservations
            .entry(pool_id.to_string())
            .or_default()
            .push(Reservation { start, end, units });
    }

    /// Moves `units` of capacity from `from_pool` to `to_pool`, effective
    /// at `at` and lasting until the next reassignment touching either
    /// pool. Used by the reassignment controller to model staff moving
    /// between lines between tasks.
    pub fn reassign(&mut self, from_pool: &str, to_pool: &str, at: NaiveDateTime, units: u32) {
        self.capacity_changes
            .entry(from_pool.to_string())
            .or_default()
            .push(CapacityChange {
                at,
                delta: -(units as i64),
            });
        self.capacity_changes
            .entry(to_pool.to_string())
            .or_default()
            .push(CapacityChange {
                at,
                delta: units as i64,
            });
    }

    pub fn pool_ids(&self) -> impl Iterator<Item = &str> {
        self.base_capacity.keys().map(|s| s.as_str())
    }
}
