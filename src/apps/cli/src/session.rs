//! One analyze/rewrite session driven through the phase controller

use std::io::Write;

use futures::StreamExt;
use log::warn;
use redraft_core_types::{
    ChangeAnalysisRequest, ChangeAnalysisResult, Phase, PhaseController, RewriteRequest,
    StreamFrame,
};
use serde_json::json;

use crate::client::{FrameResults, ServerClient};

pub struct Session {
    client: ServerClient,
    controller: PhaseController,
}

impl Session {
    pub fn new(client: ServerClient) -> Self {
        Self {
            client,
            controller: PhaseController::new(),
        }
    }

    pub fn controller(&self) -> &PhaseController {
        &self.controller
    }

    /// Runs the analysis phase, echoing the assistant's visible text to `out`.
    /// Ends in `Ready` on success or back in `Input` on failure.
    pub async fn analyze<W: Write>(&mut self, text: &str, out: &mut W) -> anyhow::Result<Phase> {
        let messages = self.controller.begin_analysis(text)?;
        let frames = match self.client.stream("/api/analysis", &json!({ "messages": messages })).await {
            Ok(frames) => frames,
            Err(e) => {
                self.controller.fail(&e.to_string());
                return Err(e);
            }
        };
        self.consume(frames, out).await?;
        Ok(self.controller.phase())
    }

    /// Runs the rewrite phase from the stored analysis, echoing chunks to `out`.
    pub async fn rewrite<W: Write>(&mut self, out: &mut W) -> anyhow::Result<Phase> {
        let request = self.controller.begin_rewrite()?;
        let frames = match self.client.stream("/api/rewrite", &request).await {
            Ok(frames) => frames,
            Err(e) => {
                self.controller.fail(&e.to_string());
                return Err(e);
            }
        };
        self.consume(frames, out).await?;
        Ok(self.controller.phase())
    }

    /// Compares the original and rewritten text of a completed session.
    pub async fn analyze_changes(&self) -> anyhow::Result<Option<ChangeAnalysisResult>> {
        let (Some(analysis), Some(rewrite)) = (self.controller.analysis(), self.controller.rewrite()) else {
            anyhow::bail!("Nothing to compare yet; run a rewrite first");
        };
        let request = ChangeAnalysisRequest {
            original_text: rewrite.original_text.clone(),
            rewritten_text: rewrite.rewritten_text.clone(),
            context: Some(RewriteRequest::from(analysis).context),
        };

        let mut frames = self.client.stream("/api/analyze-changes", &request).await?;
        let mut result = None;
        while let Some(frame) = frames.next().await {
            match frame? {
                StreamFrame::ChangeAnalysisComplete { result: r } => result = Some(r),
                StreamFrame::Error { message } => anyhow::bail!(message),
                StreamFrame::Done => break,
                _ => {}
            }
        }
        Ok(result)
    }

    async fn consume<W: Write>(&mut self, mut frames: FrameResults, out: &mut W) -> anyhow::Result<()> {
        let mut saw_done = false;
        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Stream interrupted: {}", e);
                    self.controller.fail(&e.to_string());
                    break;
                }
            };

            if let Some(text) = frame.text_content() {
                write!(out, "{}", text)?;
                out.flush()?;
            }
            if let StreamFrame::Error { message } = &frame {
                writeln!(out)?;
                writeln!(out, "{}", message)?;
            }
            self.controller.apply(&frame);
            if frame.is_terminal() {
                saw_done = true;
                break;
            }
        }

        if !saw_done && self.controller.phase().is_streaming() {
            self.controller.fail("Stream ended without completion");
        }
        writeln!(out)?;
        Ok(())
    }
}
