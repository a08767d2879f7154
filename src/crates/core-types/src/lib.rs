//! Redraft shared types
//!
//! Wire-level DTOs shared by the server, the stream reader and clients,
//! plus the client-side phase controller that sequences analyze and rewrite.

pub mod analysis;
pub mod changes;
pub mod frame;
pub mod message;
pub mod phase;
pub mod rewrite;

pub use analysis::{
    AnalysisPayload, AnalysisResult, ExtractedContext, NO_DOCUMENTS_FOUND, UNKNOWN_TEXT_TYPE,
    UNSPECIFIED,
};
pub use changes::{
    ChangeAnalysisRequest, ChangeAnalysisResult, ChangeImportance, ChangeKind, TextChange,
};
pub use frame::StreamFrame;
pub use message::{ConversationMessage, Role};
pub use phase::{Phase, PhaseController, PhaseError};
pub use rewrite::{HighlightedChange, RewriteContext, RewriteRequest, RewriteResult};
