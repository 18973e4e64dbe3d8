//! Lot expansion use case
//!
//! Turns a demand specification — either a flat unit count or a
//! prioritized list of lots — into the ordered sequence of `UnitIndex`
//! the simulator instantiates the flow against. Expanding lots here keeps
//! `Flow` itself free of any notion of quantity; a Flow describes a
//! single pass through the process, not how many times it runs.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::UnitIndex;
use crate::errors::SchedulerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSpec {
    pub label: String,
    pub units: u32,
    /// Lower runs first.
    pub priority: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demand {
    Units(u32),
    Lots(Vec<LotSpec>),
}

pub struct LotExpander;

impl LotExpander {
    /// Unit indices are assigned in priority order (ties broken by
    /// declaration order), so the event queue's unit-ascending tie-break
    /// automatically processes higher-priority lots first.
    pub fn expand(demand: &Demand) -> Result<Vec<UnitIndex>, SchedulerError> {
        match demand {
            // Zero is a valid demand: no units, no error, the simulator
            // drains an empty queue and reports a zero makespan.
            Demand::Units(n) => Ok((0..*n).map(UnitIndex).collect()),
            Demand::Lots(lots) => {
                if lots.is_empty() {
                    return Err(SchedulerError::InvalidDemand("lot list is empty".to_string()));
                }
                if lots.iter().any(|l| l.units == 0) {
                    return Err(SchedulerError::InvalidDemand("a lot cannot have zero units".to_string()));
                }
                let mut ordered: Vec<&LotSpec> = lots.iter().collect();
                ordered.sort_by_key(|l| l.priority);

                let mut units = Vec::new();
                let mut next_index = 0u32;
                for lot in ordered {
                    for _ in 0..lot.units {
                        units.push(UnitIndex(next_index));
                        next_index += 1;
                    }
                }
                Ok(units)
            }
        }
    }
}
