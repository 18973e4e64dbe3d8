pub mod calendar;
pub mod cycle;
pub mod dependency;
pub mod flow;
pub mod reassignment;
pub mod resource;
pub mod task;

pub use calendar::{BreakWindow, Calendar, ShiftWindow};
pub use cycle::{CycleBound, CycleGroup};
pub use dependency::{Dependency, EdgeKind};
pub use flow::Flow;
pub use reassignment::{ReassignmentPolicy, ReassignmentTrigger};
pub use resource::{ResourceLedger, ResourcePool};
pub use task::{CycleRole, StartCondition, TaskDefinition, TaskKind};
