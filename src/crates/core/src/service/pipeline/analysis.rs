use std::collections::BTreeSet;

use async_trait::async_trait;
use log::{debug, warn};
use redraft_agent_stream::{
    extract_analysis_payload, CompletionProtocol, MarkerProtocol, ToolOutcome,
};
use redraft_core_types::phase::ANALYSIS_APOLOGY;
use redraft_core_types::{AnalysisPayload, StreamFrame};
use redraft_services_integrations::{InstructionRetriever, SearchContext};

use crate::agentic::tools::{retrieved_documents, COMPLETE_ANALYSIS, SEARCH_DOCUMENTS};

/// Longest slice of the user's text used as a fallback retrieval query.
const FALLBACK_QUERY_CHARS: usize = 500;

/// Analysis stream: visible text as `conversation` frames, marker blocks
/// hidden, finished by `analysis_complete`.
///
/// The `completeAnalysis` tool arguments are the preferred payload source; a
/// marker-delimited block in the transcript is used when the model never
/// called the tool.
pub struct AnalysisProtocol {
    original_text: String,
    markers: MarkerProtocol,
    retriever: InstructionRetriever,
    tool_payload: Option<AnalysisPayload>,
    retrieved: Option<String>,
}

impl AnalysisProtocol {
    pub fn new(original_text: String, markers: MarkerProtocol, retriever: InstructionRetriever) -> Self {
        Self {
            original_text,
            markers,
            retriever,
            tool_payload: None,
            retrieved: None,
        }
    }

    fn payload(&self, transcript: &str) -> Option<AnalysisPayload> {
        if let Some(payload) = &self.tool_payload {
            return Some(payload.clone());
        }
        match extract_analysis_payload(transcript, &self.markers) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!("No analysis payload in transcript: {}", e);
                None
            }
        }
    }

    /// Searches on the model's behalf when it reported findings without
    /// calling `searchDocuments`.
    async fn fallback_search(&self, payload: &AnalysisPayload) -> Option<String> {
        if !self.retriever.is_enabled() {
            return None;
        }
        let query: String = self
            .original_text
            .trim()
            .chars()
            .take(FALLBACK_QUERY_CHARS)
            .collect();
        let context = SearchContext {
            text_type: payload.text_type.clone(),
            tone: payload.tone.clone(),
            purpose: payload.purpose.clone(),
            audience: payload.audience.clone(),
        };
        debug!("Running fallback document search");
        Some(self.retriever.search_documents(&query, &context).await)
    }
}

#[async_trait]
impl CompletionProtocol for AnalysisProtocol {
    fn name(&self) -> &'static str {
        "analysis"
    }

    fn markers(&self) -> MarkerProtocol {
        self.markers.clone()
    }

    fn text_frame(&self, content: String) -> StreamFrame {
        StreamFrame::conversation(content)
    }

    fn on_tool_result(&mut self, outcome: &ToolOutcome) {
        match outcome.name.as_str() {
            SEARCH_DOCUMENTS => {
                if let Some(documents) = retrieved_documents(&outcome.output) {
                    self.retrieved = Some(documents.to_string());
                }
            }
            COMPLETE_ANALYSIS => {
                match serde_json::from_value::<AnalysisPayload>(outcome.arguments.clone()) {
                    Ok(payload) => self.tool_payload = Some(payload),
                    Err(e) => warn!("Ignoring malformed completeAnalysis arguments: {}", e),
                }
            }
            _ => {}
        }
    }

    async fn finalize(&mut self, transcript: &str, seen_markers: &BTreeSet<String>) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        if !seen_markers.is_empty() {
            frames.push(StreamFrame::CleanupMarkers {
                markers: seen_markers.clone(),
            });
        }

        let Some(payload) = self.payload(transcript) else {
            return frames;
        };

        let retrieved = match self.retrieved.take() {
            Some(documents) => Some(documents),
            None => self.fallback_search(&payload).await,
        };

        let result = payload.into_result(&self.original_text, retrieved.as_deref());
        debug!(
            "Analysis complete: id={}, text_type={}",
            result.id, result.detected_text_type
        );
        frames.push(StreamFrame::analysis_complete(result));
        frames
    }

    fn failure_message(&self) -> String {
        ANALYSIS_APOLOGY.to_string()
    }
}
