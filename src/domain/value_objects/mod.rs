pub mod cycle_group_id;
pub mod indices;
pub mod minutes;
pub mod task_id;

pub use cycle_group_id::CycleGroupId;
pub use indices::{IterationIndex, UnitIndex};
pub use minutes::Minutes;
pub use task_id::TaskId;
