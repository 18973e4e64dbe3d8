pub mod in_memory_flow_repository;

pub use in_memory_flow_repository::InMemoryFlowRepository;
