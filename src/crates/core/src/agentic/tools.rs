//! Tools offered to the agents

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use redraft_ai_adapters::ToolDefinition;
use redraft_core_types::AnalysisPayload;
use redraft_services_integrations::{InstructionRetriever, SearchContext};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::util::errors::{RedraftError, RedraftResult};

pub const SEARCH_DOCUMENTS: &str = "searchDocuments";
pub const COMPLETE_ANALYSIS: &str = "completeAnalysis";

/// Separates the search summary from the documents in a `searchDocuments` result.
const RETRIEVED_INSTRUCTIONS_LABEL: &str = "\n\nRetrieved instructions: ";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments.
    fn input_schema(&self) -> Value;

    /// A successful call to a terminal tool ends the agent run.
    fn is_terminal(&self) -> bool {
        false
    }

    async fn call(&self, input: &Value) -> RedraftResult<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDocumentsInput {
    query: String,
    #[serde(default)]
    text_type: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
    #[serde(default)]
    audience: Option<String>,
}

pub struct SearchDocumentsTool {
    retriever: InstructionRetriever,
}

impl SearchDocumentsTool {
    pub fn new(retriever: InstructionRetriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &str {
        SEARCH_DOCUMENTS
    }

    fn description(&self) -> &str {
        "Search through proprietary document sources for rewriting instructions based on text type and context"
    }

    fn input_schema(&self) -> Value {
        let nullable = |description: &str| json!({ "type": ["string", "null"], "description": description });
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The main search query to find relevant documents" },
                "textType": nullable("The type of text being analyzed (e.g., 'LinkedIn post', 'email', 'blog post', 'marketing copy'). Use null if not specified."),
                "tone": nullable("The desired tone (e.g., 'professional', 'casual', 'persuasive', 'friendly'). Use null if not specified."),
                "purpose": nullable("The purpose of the text (e.g., 'networking', 'sales', 'informational', 'promotional'). Use null if not specified."),
                "audience": nullable("The target audience (e.g., 'professionals', 'customers', 'colleagues', 'general public'). Use null if not specified.")
            },
            "required": ["query", "textType", "tone", "purpose", "audience"],
            "additionalProperties": false
        })
    }

    async fn call(&self, input: &Value) -> RedraftResult<String> {
        let input: SearchDocumentsInput = serde_json::from_value(input.clone())
            .map_err(|e| RedraftError::validation(format!("Invalid searchDocuments input: {}", e)))?;
        if input.query.trim().is_empty() {
            return Err(RedraftError::validation("searchDocuments query must not be empty"));
        }

        let context = SearchContext {
            text_type: input.text_type,
            tone: input.tone,
            purpose: input.purpose,
            audience: input.audience,
        };
        let documents = self.retriever.search_documents(&input.query, &context).await;

        let mut summary = format!("Search completed for query: \"{}\"", input.query);
        if let Some(text_type) = context.text_type.as_deref().filter(|t| !t.is_empty()) {
            summary.push_str(&format!(" (Text type: {})", text_type));
        }
        let extra: serde_json::Map<String, Value> = [
            ("tone", &context.tone),
            ("purpose", &context.purpose),
            ("audience", &context.audience),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key.to_string(), Value::String(v.to_string())))
        })
        .collect();
        if !extra.is_empty() {
            summary.push_str(&format!(" (Context: {})", Value::Object(extra)));
        }

        Ok(format!(
            "{}.{}{}",
            summary, RETRIEVED_INSTRUCTIONS_LABEL, documents
        ))
    }
}

/// The documents part of a `searchDocuments` result.
pub fn retrieved_documents(output: &str) -> Option<&str> {
    output
        .split_once(RETRIEVED_INSTRUCTIONS_LABEL)
        .map(|(_, documents)| documents.trim())
        .filter(|documents| !documents.is_empty())
}

/// Typed completion channel for the analysis agent: the arguments are the
/// analysis payload.
pub struct CompleteAnalysisTool;

#[async_trait]
impl Tool for CompleteAnalysisTool {
    fn name(&self) -> &str {
        COMPLETE_ANALYSIS
    }

    fn description(&self) -> &str {
        "REQUIRED: Call this tool to finish your analysis. This must be your final action."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "textType": { "type": "string", "description": "The detected text type (e.g., 'LinkedIn post', 'email', 'blog post')" },
                "tone": { "type": ["string", "null"], "description": "The detected or desired tone (e.g., 'professional', 'casual', 'friendly')" },
                "purpose": { "type": ["string", "null"], "description": "The purpose of the text (e.g., 'networking', 'sales', 'informational')" },
                "audience": { "type": ["string", "null"], "description": "The target audience (e.g., 'professionals', 'customers', 'colleagues')" },
                "summary": { "type": "string", "description": "Brief summary of your analysis findings" },
                "recommendations": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of specific recommendations for improvement"
                }
            },
            "required": ["textType", "tone", "purpose", "audience", "summary", "recommendations"],
            "additionalProperties": false
        })
    }

    fn is_terminal(&self) -> bool {
        true
    }

    async fn call(&self, input: &Value) -> RedraftResult<String> {
        let payload: AnalysisPayload = serde_json::from_value(input.clone()).map_err(|e| {
            RedraftError::validation(format!("Invalid completeAnalysis input: {}", e))
        })?;
        debug!(
            "Analysis completed via tool: text_type={}",
            payload.text_type_or_unknown()
        );
        Ok("Analysis recorded.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redraft_core_types::NO_DOCUMENTS_FOUND;

    #[tokio::test]
    async fn search_result_mentions_query_and_context() {
        let tool = SearchDocumentsTool::new(InstructionRetriever::disabled());
        let output = tool
            .call(&json!({
                "query": "formal email",
                "textType": "email",
                "tone": "formal",
                "purpose": null,
                "audience": null
            }))
            .await
            .unwrap();
        assert!(output.starts_with(
            "Search completed for query: \"formal email\" (Text type: email) (Context: {\"tone\":\"formal\"})."
        ));
        assert_eq!(retrieved_documents(&output), Some(NO_DOCUMENTS_FOUND));
    }

    #[tokio::test]
    async fn search_requires_query() {
        let tool = SearchDocumentsTool::new(InstructionRetriever::disabled());
        let err = tool.call(&json!({ "textType": "email" })).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn complete_analysis_validates_payload_shape() {
        let tool = CompleteAnalysisTool;
        assert!(tool.is_terminal());
        assert!(tool
            .call(&json!({ "textType": "email", "recommendations": ["shorten"] }))
            .await
            .is_ok());
        assert!(tool
            .call(&json!({ "recommendations": "not a list" }))
            .await
            .is_err());
    }

    #[test]
    fn toolset_lookup_and_definitions() {
        let tools = ToolSet::new()
            .with(Arc::new(SearchDocumentsTool::new(InstructionRetriever::disabled())))
            .with(Arc::new(CompleteAnalysisTool));
        assert!(tools.get(COMPLETE_ANALYSIS).is_some());
        assert!(tools.get("missing").is_none());
        let names: Vec<String> = tools.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![SEARCH_DOCUMENTS, COMPLETE_ANALYSIS]);
    }
}
