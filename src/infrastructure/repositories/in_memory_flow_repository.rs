//! In-memory flow repository
//!
//! Mirrors the original in-memory job repository: a `Vec` behind the
//! `FlowRepository` port, indexed by name on lookup. Fine for a CLI that
//! loads one flow definition and runs it; a persistent store would
//! implement the same trait without the application layer noticing.

use crate::domain::entities::Flow;
use crate::domain::repositories::FlowRepository;

#[derive(Debug, Default)]
pub struct InMemoryFlowRepository {
    flows: Vec<Flow>,
}

impl InMemoryFlowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlowRepository for InMemoryFlowRepository {
    fn save(&mut self, flow: Flow) {
        if let Some(existing) = self.flows.iter_mut().find(|f| f.name == flow.name) {
            *existing = flow;
        } else {
            self.flows.push(flow);
        }
    }

    fn find_by_name(&self, name: &str) -> Option<&Flow> {
        self.flows.iter().find(|f| f.name == name)
    }

    fn all(&self) -> Vec<&Flow> {
        self.flows.iter().collect()
    }
}
