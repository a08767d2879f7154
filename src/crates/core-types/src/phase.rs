//! Client-side phase controller
//!
//! `input -> analyzing -> ready -> rewriting -> complete`, where the two
//! streaming phases roll back to their predecessor when a stream fails or
//! ends without a result.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::frame::StreamFrame;
use crate::message::{ConversationMessage, Role};
use crate::rewrite::{RewriteRequest, RewriteResult};

pub const ANALYSIS_APOLOGY: &str = "Sorry, there was an error during analysis. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Input,
    Analyzing,
    Ready,
    Rewriting,
    Complete,
}

impl Phase {
    pub fn is_streaming(self) -> bool {
        matches!(self, Self::Analyzing | Self::Rewriting)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("a {0:?} stream is already in flight")]
    Busy(Phase),
    #[error("input text is empty")]
    EmptyInput,
    #[error("no completed analysis to rewrite from")]
    NotReady,
}

#[derive(Debug, Clone)]
pub struct PhaseController {
    phase: Phase,
    messages: Vec<ConversationMessage>,
    analysis: Option<AnalysisResult>,
    rewrite: Option<RewriteResult>,
    streamed_rewrite: String,
    last_error: Option<String>,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            phase: Phase::Input,
            messages: Vec::new(),
            analysis: None,
            rewrite: None,
            streamed_rewrite: String::new(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn rewrite(&self) -> Option<&RewriteResult> {
        self.rewrite.as_ref()
    }

    /// Message of the most recent failed stream, cleared when a new one starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a fresh analysis and returns the messages to send.
    pub fn begin_analysis(&mut self, text: &str) -> Result<Vec<ConversationMessage>, PhaseError> {
        if self.phase.is_streaming() {
            return Err(PhaseError::Busy(self.phase));
        }
        if text.trim().is_empty() {
            return Err(PhaseError::EmptyInput);
        }

        self.reset();
        let user = ConversationMessage::user(text);
        self.messages.push(user.clone());
        self.messages.push(ConversationMessage::assistant(""));
        self.phase = Phase::Analyzing;
        Ok(vec![user])
    }

    /// Starts a rewrite from the stored analysis and returns the request to send.
    pub fn begin_rewrite(&mut self) -> Result<RewriteRequest, PhaseError> {
        if self.phase.is_streaming() {
            return Err(PhaseError::Busy(self.phase));
        }
        let analysis = match (&self.analysis, self.phase) {
            (Some(analysis), Phase::Ready | Phase::Complete) => analysis,
            _ => return Err(PhaseError::NotReady),
        };

        let request = RewriteRequest::from(analysis);
        self.rewrite = None;
        self.streamed_rewrite.clear();
        self.last_error = None;
        self.phase = Phase::Rewriting;
        Ok(request)
    }

    pub fn apply(&mut self, frame: &StreamFrame) {
        match frame {
            StreamFrame::Conversation { content } => {
                if let Some(last) = self.last_assistant_mut() {
                    last.append(content);
                }
            }
            StreamFrame::CleanupMarkers { markers } => {
                if let Some(last) = self.last_assistant_mut() {
                    let mut cut = last.content.len();
                    for marker in markers.iter().filter(|m| !m.is_empty()) {
                        if let Some(pos) = last.content.find(marker.as_str()) {
                            cut = cut.min(pos);
                        }
                    }
                    last.content.truncate(cut);
                    last.content = last.content.trim().to_string();
                }
            }
            StreamFrame::AnalysisComplete { analysis_result } => {
                if self.phase == Phase::Analyzing {
                    self.analysis = Some(analysis_result.as_ref().clone());
                    self.phase = Phase::Ready;
                }
            }
            StreamFrame::RewriteChunk { content } => {
                if self.phase == Phase::Rewriting {
                    self.streamed_rewrite.push_str(content);
                    let original = self
                        .analysis
                        .as_ref()
                        .map(|a| a.original_text.as_str())
                        .unwrap_or_default();
                    self.rewrite = Some(RewriteResult::streaming(original, &self.streamed_rewrite));
                }
            }
            StreamFrame::RewriteComplete { result } => {
                if self.phase == Phase::Rewriting {
                    self.rewrite = Some(result.clone());
                    self.phase = Phase::Complete;
                }
            }
            StreamFrame::Error { message } => self.fail(message),
            StreamFrame::Done => {
                // A stream that ended without its completion frame counts as failed,
                // but without replacing whatever the assistant already said.
                match self.phase {
                    Phase::Analyzing => self.phase = Phase::Input,
                    Phase::Rewriting => {
                        self.rewrite = None;
                        self.phase = Phase::Ready;
                    }
                    _ => {}
                }
            }
            StreamFrame::AnalysisProgress { .. } | StreamFrame::ChangeAnalysisComplete { .. } => {}
        }
    }

    /// Rolls back a failed stream: analysis returns to input with an apology,
    /// rewrite returns to ready and keeps the analysis for a retry.
    pub fn fail(&mut self, reason: &str) {
        match self.phase {
            Phase::Analyzing => {
                if let Some(last) = self.last_assistant_mut() {
                    last.content = ANALYSIS_APOLOGY.to_string();
                }
                self.analysis = None;
                self.phase = Phase::Input;
            }
            Phase::Rewriting => {
                self.rewrite = None;
                self.streamed_rewrite.clear();
                self.phase = Phase::Ready;
            }
            _ => return,
        }
        self.last_error = Some(reason.to_string());
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn last_assistant_mut(&mut self) -> Option<&mut ConversationMessage> {
        self.messages
            .last_mut()
            .filter(|message| message.role == Role::Assistant)
    }
}
