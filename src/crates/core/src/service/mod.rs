//! Service layer - configuration and request pipelines

pub mod config;
pub mod pipeline;

pub use config::AppConfig;
pub use pipeline::{FrameStream, RewriteAssistant};
