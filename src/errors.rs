//! Error taxonomy
//!
//! One enum per architectural layer boundary, in the style the original
//! job-weaver analyzer used for its own `AnalysisError`: each variant names
//! a specific way a flow, calendar or simulation run can fail, so callers
//! can match on the failure instead of parsing a message. `main.rs` folds
//! these into `anyhow::Error` at the CLI boundary.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::value_objects::TaskId;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("flow has no tasks")]
    EmptyFlow,

    #[error("task {0} is referenced as a dependency but is not defined in the flow")]
    UnknownTask(TaskId),

    #[error("task {0} depends on itself directly")]
    SelfDependency(TaskId),

    #[error("task {0} has a back-edge that is not part of a declared cycle group")]
    UndeclaredCycle(TaskId),

    #[error("cycle group {group} does not form a single connected loop: {detail}")]
    MalformedCycleGroup { group: String, detail: String },

    #[error("sequential group {group} is not a single linear chain: {detail}")]
    MalformedSequentialGroup { group: String, detail: String },

    #[error("flow has no reachable root and no task is classified auto-triggered or manually triggered")]
    NoReachableRoot,

    #[error("flow contains an undeclared cycle through tasks: {0:?}")]
    UnexpectedCycle(Vec<TaskId>),

    #[error("calendar is misconfigured: {0}")]
    CalendarMisconfigured(String),

    #[error("task {0} requires a resource pool that the flow does not define")]
    UnknownResourcePool(String),

    #[error("task {0} requires {1} workers but the staffed pool only has {2}")]
    InsufficientStaffing(TaskId, u32, u32),

    #[error("simulation exceeded its time horizon; last event scheduled at {last_event_at}")]
    HorizonExceeded { last_event_at: NaiveDateTime },

    #[error("tasks never reached running: {blocking:?}")]
    DeadlockDetected { blocking: Vec<TaskId> },

    #[error("demand specification is invalid: {0}")]
    InvalidDemand(String),

    #[error("optimiser request is invalid: {0}")]
    InvalidOptimiserRequest(String),

    #[error("optimiser could not find a worker count satisfying the deadline within the search bound")]
    DeadlineUnreachable,

    #[error("optimiser run was cancelled")]
    Cancelled,

    #[error("reassignment policy references unknown pool: {0}")]
    UnknownReassignmentPool(String),

    #[error("failed to parse flow definition: {0}")]
    ParseError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
