//! Flow repository trait
//!
//! Mirrors the original job repository port: the domain layer depends on
//! this trait, never on a concrete store, so the application layer can be
//! exercised against an in-memory stand-in in tests while the CLI wires a
//! real implementation in `infrastructure::repositories`.

use crate::domain::entities::Flow;

pub trait FlowRepository {
    fn save(&mut self, flow: Flow);
    fn find_by_name(&self, name: &str) -> Option<&Flow>;
    fn all(&self) -> Vec<&Flow>;
}
