pub mod expand_lots;
pub mod optimise_workers;
pub mod simulate_flow;
pub mod validate_flow;

pub use expand_lots::{Demand, LotExpander, LotSpec};
pub use optimise_workers::{IndicatifProgressSink, NullProgressSink, OptimiseWorkers, OptimiserRequest, OptimiserResult, ProgressSink};
pub use simulate_flow::{SimulateFlow, SimulationResult};
pub use validate_flow::ValidateFlow;
