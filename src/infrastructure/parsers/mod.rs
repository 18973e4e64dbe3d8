pub mod flow_definition_dto;
pub mod flow_definition_loader;

pub use flow_definition_dto::FlowDefinitionDto;
pub use flow_definition_loader::FlowDefinitionLoader;
