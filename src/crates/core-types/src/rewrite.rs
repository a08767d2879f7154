use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisResult, UNSPECIFIED};

/// Explanation shown while a rewrite is still streaming.
pub const STREAMING_EXPLANATION: &str = "Processing...";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteContext {
    #[serde(default)]
    pub text_type: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

impl RewriteContext {
    pub fn tone_or_unspecified(&self) -> &str {
        or_unspecified(self.tone.as_deref())
    }

    pub fn purpose_or_unspecified(&self) -> &str {
        or_unspecified(self.purpose.as_deref())
    }

    pub fn audience_or_unspecified(&self) -> &str {
        or_unspecified(self.audience.as_deref())
    }
}

fn or_unspecified(value: Option<&str>) -> &str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNSPECIFIED)
}

/// Body of `POST /api/rewrite`. Required fields default to empty so that the
/// service can report exactly which ones are missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub context: RewriteContext,
}

impl From<&AnalysisResult> for RewriteRequest {
    fn from(analysis: &AnalysisResult) -> Self {
        let context = &analysis.extracted_context;
        let specified = |value: &str| (value != UNSPECIFIED).then(|| value.to_string());
        Self {
            analysis_id: Some(analysis.id.clone()),
            original_text: analysis.original_text.clone(),
            instructions: analysis.retrieved_instructions.clone(),
            context: RewriteContext {
                text_type: analysis.detected_text_type.clone(),
                tone: specified(&context.tone),
                purpose: specified(&context.purpose),
                audience: specified(&context.audience),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedChange {
    pub before: String,
    pub after: String,
    pub change_type: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResult {
    pub original_text: String,
    pub rewritten_text: String,
    pub explanation: String,
    #[serde(default)]
    pub changes_highlighted: Vec<HighlightedChange>,
    #[serde(default)]
    pub key_improvements: Vec<String>,
}

impl RewriteResult {
    /// Placeholder result rendered while chunks are still arriving.
    pub fn streaming(original_text: &str, streamed: &str) -> Self {
        Self {
            original_text: original_text.to_string(),
            rewritten_text: streamed.to_string(),
            explanation: STREAMING_EXPLANATION.to_string(),
            changes_highlighted: Vec::new(),
            key_improvements: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisPayload;

    #[test]
    fn request_from_analysis_drops_placeholders() {
        let analysis = AnalysisPayload {
            text_type: Some("email".into()),
            tone: Some("formal".into()),
            ..Default::default()
        }
        .into_result("Dear team", None);

        let request = RewriteRequest::from(&analysis);
        assert_eq!(request.analysis_id.as_deref(), Some(analysis.id.as_str()));
        assert_eq!(request.context.text_type, "email");
        assert_eq!(request.context.tone.as_deref(), Some("formal"));
        assert!(request.context.purpose.is_none());
        assert_eq!(request.context.purpose_or_unspecified(), UNSPECIFIED);
    }

    #[test]
    fn request_tolerates_missing_fields() {
        let request: RewriteRequest = serde_json::from_str(r#"{"originalText":"hi"}"#).unwrap();
        assert_eq!(request.original_text, "hi");
        assert!(request.instructions.is_empty());
        assert!(request.context.text_type.is_empty());
    }
}
