//! Validate flow use case
//!
//! Thin application-layer wrapper around `FlowValidator`, mirroring the
//! original `build_dependency_graph` use case's role: the CLI and other
//! use cases depend on this entry point, not on the validator service
//! directly.

use crate::application::services::FlowValidator;
use crate::domain::entities::Flow;
use crate::errors::SchedulerError;

pub struct ValidateFlow;

impl ValidateFlow {
    pub fn validate(flow: &Flow) -> Result<(), SchedulerError> {
        FlowValidator::validate(flow)
    }
}
