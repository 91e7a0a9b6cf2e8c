//! Agent module — classification, reply composition, and the orchestrator.

pub mod classifier;
pub mod composer;
pub mod filter;
pub mod orchestrator;
pub mod plan;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::ActionClassifier;
pub use composer::ReplyComposer;
pub use filter::ReplyFilter;
pub use orchestrator::{AgentOrchestrator, AgentStage};
pub use plan::{Action, ActionPlan, AgentInput, AgentResult, FileFormat};
