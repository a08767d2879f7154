use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a text type the model did not report.
pub const UNKNOWN_TEXT_TYPE: &str = "Unknown";
/// Placeholder for tone/purpose/audience the model did not report.
pub const UNSPECIFIED: &str = "not specified";
/// Instruction text used whenever retrieval produced nothing usable.
pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContext {
    pub tone: String,
    pub purpose: String,
    pub audience: String,
}

impl Default for ExtractedContext {
    fn default() -> Self {
        Self {
            tone: UNSPECIFIED.to_string(),
            purpose: UNSPECIFIED.to_string(),
            audience: UNSPECIFIED.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    pub original_text: String,
    pub detected_text_type: String,
    pub extracted_context: ExtractedContext,
    pub retrieved_instructions: String,
    pub recommendations: Vec<String>,
    pub ready_to_rewrite: bool,
    pub timestamp: DateTime<Utc>,
}

/// Structured analysis data recovered from a completion, either from a
/// marker-delimited block in the transcript or from the `completeAnalysis`
/// tool arguments. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisPayload {
    pub text_type: Option<String>,
    pub tone: Option<String>,
    pub purpose: Option<String>,
    pub audience: Option<String>,
    pub instructions: Option<String>,
    pub summary: Option<String>,
    pub recommendations: Option<Vec<String>>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl AnalysisPayload {
    pub fn text_type_or_unknown(&self) -> &str {
        non_empty(self.text_type.as_deref()).unwrap_or(UNKNOWN_TEXT_TYPE)
    }

    /// Guidance written by the model itself; `instructions` wins over `summary`.
    pub fn guidance(&self) -> Option<&str> {
        non_empty(self.instructions.as_deref()).or_else(|| non_empty(self.summary.as_deref()))
    }

    pub fn tone(&self) -> Option<&str> {
        non_empty(self.tone.as_deref())
    }

    pub fn purpose(&self) -> Option<&str> {
        non_empty(self.purpose.as_deref())
    }

    pub fn audience(&self) -> Option<&str> {
        non_empty(self.audience.as_deref())
    }

    /// Builds the final result, substituting placeholders for anything missing.
    pub fn into_result(self, original_text: &str, retrieved: Option<&str>) -> AnalysisResult {
        let retrieved = non_empty(retrieved).filter(|r| *r != NO_DOCUMENTS_FOUND);
        let retrieved_instructions = match (self.guidance(), retrieved) {
            (Some(guidance), Some(documents)) => format!(
                "{}\n\nRetrieved writing instructions:\n{}",
                guidance, documents
            ),
            (Some(guidance), None) => guidance.to_string(),
            (None, Some(documents)) => documents.to_string(),
            (None, None) => NO_DOCUMENTS_FOUND.to_string(),
        };

        let extracted_context = ExtractedContext {
            tone: self.tone().unwrap_or(UNSPECIFIED).to_string(),
            purpose: self.purpose().unwrap_or(UNSPECIFIED).to_string(),
            audience: self.audience().unwrap_or(UNSPECIFIED).to_string(),
        };

        AnalysisResult {
            id: uuid::Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            detected_text_type: self.text_type_or_unknown().to_string(),
            extracted_context,
            retrieved_instructions,
            recommendations: self
                .recommendations
                .unwrap_or_default()
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            ready_to_rewrite: true,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_yields_fully_populated_result() {
        let result = AnalysisPayload::default().into_result("hello", None);
        assert_eq!(result.detected_text_type, UNKNOWN_TEXT_TYPE);
        assert_eq!(result.extracted_context, ExtractedContext::default());
        assert_eq!(result.retrieved_instructions, NO_DOCUMENTS_FOUND);
        assert!(result.recommendations.is_empty());
        assert!(result.ready_to_rewrite);
        assert!(!result.id.is_empty());
        assert_eq!(result.original_text, "hello");
    }

    #[test]
    fn blank_strings_are_treated_as_missing() {
        let payload = AnalysisPayload {
            text_type: Some("  ".into()),
            tone: Some("".into()),
            ..Default::default()
        };
        let result = payload.into_result("x", Some("   "));
        assert_eq!(result.detected_text_type, UNKNOWN_TEXT_TYPE);
        assert_eq!(result.extracted_context.tone, UNSPECIFIED);
        assert_eq!(result.retrieved_instructions, NO_DOCUMENTS_FOUND);
    }

    #[test]
    fn instructions_take_precedence_over_summary_and_merge_documents() {
        let payload = AnalysisPayload {
            instructions: Some("be concise".into()),
            summary: Some("a summary".into()),
            ..Default::default()
        };
        let result = payload.into_result("x", Some("Document 1:\nUse short sentences."));
        assert!(result.retrieved_instructions.starts_with("be concise"));
        assert!(result
            .retrieved_instructions
            .contains("Use short sentences."));
        assert!(!result.retrieved_instructions.contains("a summary"));
    }

    #[test]
    fn payload_accepts_nulls_and_missing_fields() {
        let payload: AnalysisPayload = serde_json::from_str(
            r#"{"textType":"email","tone":"formal","purpose":null,"recommendations":["shorten"]}"#,
        )
        .unwrap();
        assert_eq!(payload.text_type.as_deref(), Some("email"));
        assert!(payload.purpose.is_none());
        assert!(payload.audience.is_none());
        assert_eq!(payload.recommendations, Some(vec!["shorten".to_string()]));
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = AnalysisPayload::default().into_result("x", None);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("detectedTextType").is_some());
        assert!(json.get("extractedContext").is_some());
        assert!(json.get("readyToRewrite").is_some());
    }
}
