pub mod cycle_controller;
pub mod event_queue;
pub mod flow_validator;
pub mod reassignment_controller;
pub mod trace;

pub use cycle_controller::{CycleController, CycleStatus};
pub use event_queue::{Event, EventKind, EventQueue};
pub use flow_validator::FlowValidator;
pub use reassignment_controller::{DeferredLanding, ReassignmentController};
pub use trace::{Trace, TraceEntry, WaitReason};
