pub mod application;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod presentation;

pub use errors::SchedulerError;
