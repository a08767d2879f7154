//! Streaming adapter for OpenAI-compatible chat-completions providers.
//!
//! The provider's SSE body is normalized into [`UnifiedResponse`] deltas by
//! [`stream_handler::handle_openai_stream`]; callers only see the
//! [`CompletionProvider`] trait.

pub mod client;
pub mod provider;
pub mod stream_handler;
pub mod tool_calls;
pub mod types;

pub use client::{OpenAIClient, OpenAIConfig};
pub use provider::{
    ChatMessage, ChatRole, CompletionProvider, CompletionRequest, ProviderStream, ToolCall,
    ToolDefinition,
};
pub use tool_calls::{AssembledToolCall, ToolCallAccumulator};
pub use types::unified::{UnifiedResponse, UnifiedTokenUsage, UnifiedToolCall};
