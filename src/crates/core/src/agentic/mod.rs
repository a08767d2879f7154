//! Agentic layer - agent definitions, prompts, tools and the runner loop

pub mod agents;
pub mod prompts;
pub mod runner;
pub mod tools;

pub use agents::AgentDefinition;
pub use runner::AgentRunner;
pub use tools::{Tool, ToolSet};
