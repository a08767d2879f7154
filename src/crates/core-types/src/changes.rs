use serde::{Deserialize, Serialize};

use crate::rewrite::RewriteContext;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAnalysisRequest {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub rewritten_text: String,
    #[serde(default)]
    pub context: Option<RewriteContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Grammar,
    Tone,
    Structure,
    Clarity,
    Conciseness,
    Impact,
}

impl ChangeKind {
    /// Lenient label mapping for model output; unknown labels count as clarity edits.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "grammar" => Self::Grammar,
            "tone" => Self::Tone,
            "structure" => Self::Structure,
            "conciseness" => Self::Conciseness,
            "impact" => Self::Impact,
            _ => Self::Clarity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeImportance {
    High,
    Medium,
    Low,
}

impl ChangeImportance {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub original_phrase: String,
    pub rewritten_phrase: String,
    pub explanation: String,
    /// Character offset of `original_phrase` in the original text (0 when not found).
    pub start_pos: usize,
    pub end_pos: usize,
    pub importance: ChangeImportance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAnalysisResult {
    pub changes: Vec<TextChange>,
    pub summary: String,
    pub overall_improvements: Vec<String>,
}

impl ChangeAnalysisResult {
    /// Generic result returned when the model output cannot be parsed.
    pub fn fallback() -> Self {
        Self {
            changes: Vec::new(),
            summary: "Text analysis completed. The rewritten version shows improvements in clarity, tone, and structure.".to_string(),
            overall_improvements: vec![
                "Enhanced professional tone".to_string(),
                "Improved clarity and readability".to_string(),
                "Better structure and flow".to_string(),
            ],
        }
    }
}
