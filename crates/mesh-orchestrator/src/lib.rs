pub mod micro_resolve;
pub mod orchestrator;
pub mod plan_gen;
pub mod prompts;
pub mod synthesis;
pub mod workflow;

pub use orchestrator::{Orchestrator, OrchestrationOutcome, RequestMode};
pub use workflow::WorkflowTemplate;
