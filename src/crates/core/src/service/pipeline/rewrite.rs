use std::collections::BTreeSet;

use async_trait::async_trait;
use log::warn;
use redraft_agent_stream::{build_rewrite_result, CompletionProtocol};
use redraft_core_types::StreamFrame;

pub const REWRITE_APOLOGY: &str = "Sorry, there was an error while rewriting. Please try again.";

/// Rewrite stream: every fragment as `rewrite_chunk`, finished by
/// `rewrite_complete` parsed from the section headers.
pub struct RewriteProtocol {
    original_text: String,
}

impl RewriteProtocol {
    pub fn new(original_text: String) -> Self {
        Self { original_text }
    }
}

#[async_trait]
impl CompletionProtocol for RewriteProtocol {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn text_frame(&self, content: String) -> StreamFrame {
        StreamFrame::rewrite_chunk(content)
    }

    async fn finalize(&mut self, transcript: &str, _seen_markers: &BTreeSet<String>) -> Vec<StreamFrame> {
        match build_rewrite_result(transcript, &self.original_text) {
            Some(result) => vec![StreamFrame::RewriteComplete { result }],
            None => {
                warn!("Rewrite produced no text");
                Vec::new()
            }
        }
    }

    fn failure_message(&self) -> String {
        REWRITE_APOLOGY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_transcript_has_no_completion() {
        let mut protocol = RewriteProtocol::new("old".into());
        assert!(protocol.finalize("  ", &BTreeSet::new()).await.is_empty());
    }

    #[tokio::test]
    async fn sections_become_the_result() {
        let mut protocol = RewriteProtocol::new("old".into());
        let frames = protocol
            .finalize("**REWRITTEN TEXT:** new\n**EXPLANATION:** why", &BTreeSet::new())
            .await;
        assert!(matches!(&frames[..], [StreamFrame::RewriteComplete { result }]
            if result.rewritten_text == "new" && result.explanation == "why" && result.original_text == "old"));
    }
}
