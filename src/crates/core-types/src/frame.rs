use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::changes::ChangeAnalysisResult;
use crate::rewrite::RewriteResult;

/// One event delivered to a stream consumer.
///
/// Serialized with a `type` discriminator, e.g.
/// `{"type":"conversation","content":"..."}`. `Done` terminates every stream;
/// the SSE transport writes it as the literal `[DONE]` sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamFrame {
    Conversation {
        content: String,
    },
    CleanupMarkers {
        markers: BTreeSet<String>,
    },
    AnalysisComplete {
        #[serde(rename = "analysisResult")]
        analysis_result: Box<AnalysisResult>,
    },
    RewriteChunk {
        content: String,
    },
    RewriteComplete {
        result: RewriteResult,
    },
    AnalysisProgress {
        content: String,
    },
    ChangeAnalysisComplete {
        result: ChangeAnalysisResult,
    },
    Error {
        message: String,
    },
    Done,
}

impl StreamFrame {
    pub fn conversation(content: impl Into<String>) -> Self {
        Self::Conversation {
            content: content.into(),
        }
    }

    pub fn rewrite_chunk(content: impl Into<String>) -> Self {
        Self::RewriteChunk {
            content: content.into(),
        }
    }

    pub fn analysis_progress(content: impl Into<String>) -> Self {
        Self::AnalysisProgress {
            content: content.into(),
        }
    }

    pub fn analysis_complete(analysis_result: AnalysisResult) -> Self {
        Self::AnalysisComplete {
            analysis_result: Box::new(analysis_result),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Wire discriminator of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conversation { .. } => "conversation",
            Self::CleanupMarkers { .. } => "cleanup_markers",
            Self::AnalysisComplete { .. } => "analysis_complete",
            Self::RewriteChunk { .. } => "rewrite_chunk",
            Self::RewriteComplete { .. } => "rewrite_complete",
            Self::AnalysisProgress { .. } => "analysis_progress",
            Self::ChangeAnalysisComplete { .. } => "change_analysis_complete",
            Self::Error { .. } => "error",
            Self::Done => "done",
        }
    }

    /// Incremental text carried by the frame, if any.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            Self::Conversation { content }
            | Self::RewriteChunk { content }
            | Self::AnalysisProgress { content } => Some(content),
            _ => None,
        }
    }
}
