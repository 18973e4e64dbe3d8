pub mod simulation_output;

pub use simulation_output::{OptimiserReport, SimulationReport, TraceEntryDto, ValidationReport};
