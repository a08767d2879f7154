use std::sync::Arc;

use redraft_core_types::RewriteContext;
use redraft_services_integrations::InstructionRetriever;

use super::prompts;
use super::tools::{CompleteAnalysisTool, SearchDocumentsTool, ToolSet};

/// Everything the runner needs to drive one agent.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub name: &'static str,
    pub instructions: String,
    pub tools: ToolSet,
    pub temperature: Option<f32>,
}

impl AgentDefinition {
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

pub fn analysis_agent(retriever: InstructionRetriever, marker_fallback: bool) -> AgentDefinition {
    AgentDefinition {
        name: "Text Analysis Agent",
        instructions: prompts::analysis_instructions(marker_fallback),
        tools: ToolSet::new()
            .with(Arc::new(SearchDocumentsTool::new(retriever)))
            .with(Arc::new(CompleteAnalysisTool)),
        temperature: None,
    }
}

pub fn rewrite_agent(context: &RewriteContext) -> AgentDefinition {
    AgentDefinition {
        name: "Text Rewriting Specialist",
        instructions: prompts::rewrite_instructions(context),
        tools: ToolSet::new(),
        temperature: None,
    }
}

pub fn change_analyzer(context: Option<&RewriteContext>) -> AgentDefinition {
    AgentDefinition {
        name: "Text Change Analyzer",
        instructions: prompts::change_analysis_instructions(context),
        tools: ToolSet::new(),
        temperature: None,
    }
}
