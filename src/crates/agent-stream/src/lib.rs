//! Streamed-completion processing.
//!
//! [`CompletionStreamReader`] turns model output into [`StreamFrame`]s. The
//! analysis protocol hides marker-delimited payloads from the visible text
//! with [`MarkerFilter`] and recovers them with [`extract_analysis_payload`];
//! the rewrite and change-analysis extractors parse their own formats.
//!
//! [`StreamFrame`]: redraft_core_types::StreamFrame

pub mod changes;
pub mod error;
pub mod extract;
pub mod filter;
pub mod json_recovery;
pub mod markers;
pub mod reader;
pub mod rewrite;

pub use changes::extract_change_analysis;
pub use error::ExtractionError;
pub use extract::{extract_analysis_payload, strip_markers};
pub use filter::MarkerFilter;
pub use markers::{MarkerProtocol, MarkerRule, MARKER_PROTOCOL_VERSION};
pub use reader::{
    CompletionEvent, CompletionProtocol, CompletionSource, CompletionStreamReader, ReadOutcome,
    ToolOutcome,
};
pub use rewrite::{build_rewrite_result, RewriteSections};
