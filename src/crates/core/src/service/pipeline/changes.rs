use std::collections::BTreeSet;

use async_trait::async_trait;
use log::warn;
use redraft_agent_stream::{extract_change_analysis, CompletionProtocol};
use redraft_core_types::{ChangeAnalysisResult, StreamFrame};

pub const CHANGE_ANALYSIS_APOLOGY: &str =
    "Sorry, there was an error while analyzing the changes. Please try again.";

/// Change-analysis stream: raw model output as `analysis_progress`, finished
/// by `change_analysis_complete`. Unparsable output yields the generic result.
pub struct ChangeAnalysisProtocol {
    original_text: String,
}

impl ChangeAnalysisProtocol {
    pub fn new(original_text: String) -> Self {
        Self { original_text }
    }
}

#[async_trait]
impl CompletionProtocol for ChangeAnalysisProtocol {
    fn name(&self) -> &'static str {
        "change-analysis"
    }

    fn text_frame(&self, content: String) -> StreamFrame {
        StreamFrame::analysis_progress(content)
    }

    async fn finalize(&mut self, transcript: &str, _seen_markers: &BTreeSet<String>) -> Vec<StreamFrame> {
        let result = extract_change_analysis(transcript, &self.original_text).unwrap_or_else(|e| {
            warn!("Change analysis output not parseable, using fallback: {}", e);
            ChangeAnalysisResult::fallback()
        });
        vec![StreamFrame::ChangeAnalysisComplete { result }]
    }

    fn failure_message(&self) -> String {
        CHANGE_ANALYSIS_APOLOGY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unparsable_output_uses_fallback() {
        let mut protocol = ChangeAnalysisProtocol::new("hey".into());
        let frames = protocol.finalize("no json here", &BTreeSet::new()).await;
        assert_eq!(
            frames,
            vec![StreamFrame::ChangeAnalysisComplete {
                result: ChangeAnalysisResult::fallback()
            }]
        );
    }

    #[tokio::test]
    async fn parsed_changes_are_located() {
        let mut protocol = ChangeAnalysisProtocol::new("hey there".into());
        let transcript = r#"```json
{"changes":[{"type":"tone","originalPhrase":"hey","rewrittenPhrase":"Hello","explanation":"formal","importance":"high"}],"summary":"Better.","overallImprovements":["tone"]}
```"#;
        let frames = protocol.finalize(transcript, &BTreeSet::new()).await;
        let StreamFrame::ChangeAnalysisComplete { result } = &frames[0] else {
            panic!("expected change analysis frame");
        };
        assert_eq!(result.changes[0].id, "change-1");
        assert_eq!((result.changes[0].start_pos, result.changes[0].end_pos), (0, 3));
        assert_eq!(result.summary, "Better.");
    }
}
