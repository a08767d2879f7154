// Redraft Core Library - agents, pipelines and configuration
// Four-layer architecture: Util -> Infrastructure -> Service -> Agentic

pub mod agentic; // Agentic layer - agent definitions, tools, runner loop
pub mod infrastructure; // Infrastructure layer - provider and retrieval clients
pub mod service; // Service layer - configuration, request pipelines
pub mod util; // Utility layer - errors

// Export main types
pub use util::errors::*;

pub use service::{
    config::{AppConfig, ProviderConfig, RetrievalConfig, ServerConfig, StreamConfig},
    pipeline::{FrameStream, RewriteAssistant},
};

pub use agentic::{AgentDefinition, AgentRunner, Tool, ToolSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CORE_NAME: &str = "Redraft Core";
