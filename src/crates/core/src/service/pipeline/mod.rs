//! Request pipelines
//!
//! [`RewriteAssistant`] validates a request, starts the matching agent and
//! attaches the protocol that turns its output into frames. It holds no
//! per-request state and is shared behind an `Arc`.

pub mod analysis;
pub mod changes;
pub mod rewrite;

use std::sync::Arc;
use std::time::Duration;

use log::info;
use redraft_agent_stream::{CompletionProtocol, CompletionStreamReader, MarkerProtocol};
use redraft_ai_adapters::{ChatMessage, CompletionProvider};
use redraft_core_types::{
    ChangeAnalysisRequest, ConversationMessage, Role, RewriteRequest, StreamFrame,
};
use redraft_services_integrations::InstructionRetriever;
use tokio_stream::wrappers::ReceiverStream;

use crate::agentic::{agents, prompts, AgentDefinition, AgentRunner};
use crate::infrastructure::{build_provider, build_retriever};
use crate::service::config::AppConfig;
use crate::util::errors::{RedraftError, RedraftResult};

pub use analysis::AnalysisProtocol;
pub use changes::ChangeAnalysisProtocol;
pub use rewrite::RewriteProtocol;

pub type FrameStream = ReceiverStream<StreamFrame>;

pub const INVALID_MESSAGE_FORMAT: &str = "Invalid message format";
pub const MISSING_REWRITE_FIELDS: &str = "Missing required fields: originalText and instructions";
pub const MISSING_CHANGE_FIELDS: &str = "Missing required fields: originalText and rewrittenText";

#[derive(Clone)]
pub struct RewriteAssistant {
    runner: AgentRunner,
    retriever: InstructionRetriever,
    markers: MarkerProtocol,
    idle_timeout: Duration,
    frame_buffer: usize,
    temperature: Option<f32>,
}

impl RewriteAssistant {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        retriever: InstructionRetriever,
        config: &AppConfig,
    ) -> Self {
        let markers = if config.stream.legacy_marker_fallback {
            MarkerProtocol::analysis_v1().with_legacy_sentinels()
        } else {
            MarkerProtocol::analysis_v1()
        };
        Self {
            runner: AgentRunner::new(provider, config.stream.max_agent_rounds),
            retriever,
            markers,
            idle_timeout: config.stream.idle_timeout(),
            frame_buffer: config.stream.frame_buffer,
            temperature: config.provider.temperature,
        }
    }

    pub fn from_config(config: &AppConfig) -> RedraftResult<Self> {
        let provider = build_provider(&config.provider);
        let retriever = build_retriever(&config.retrieval)?;
        Ok(Self::new(provider, retriever, config))
    }

    /// Streams the analysis of the last user message.
    pub fn analyze(&self, messages: Vec<ConversationMessage>) -> RedraftResult<FrameStream> {
        let original_text = match messages.last() {
            Some(last) if last.is_user() && !last.content.trim().is_empty() => last.content.clone(),
            _ => return Err(RedraftError::validation(INVALID_MESSAGE_FORMAT)),
        };

        let conversation = messages
            .into_iter()
            .filter(|message| !message.content.trim().is_empty())
            .map(|message| match message.role {
                Role::User => ChatMessage::user(message.content),
                Role::Assistant => ChatMessage::assistant(message.content),
            })
            .collect();

        info!("Starting analysis: chars={}", original_text.chars().count());
        let agent = agents::analysis_agent(self.retriever.clone(), true);
        let protocol = AnalysisProtocol::new(original_text, self.markers.clone(), self.retriever.clone());
        Ok(self.start(agent, conversation, protocol))
    }

    pub fn rewrite(&self, request: RewriteRequest) -> RedraftResult<FrameStream> {
        if request.original_text.trim().is_empty() || request.instructions.trim().is_empty() {
            return Err(RedraftError::validation(MISSING_REWRITE_FIELDS));
        }

        info!(
            "Starting rewrite: analysis_id={}, text_type={}",
            request.analysis_id.as_deref().unwrap_or("-"),
            request.context.text_type
        );
        let agent = agents::rewrite_agent(&request.context);
        let prompt = prompts::rewrite_prompt(&request.original_text, &request.instructions, &request.context);
        let protocol = RewriteProtocol::new(request.original_text);
        Ok(self.start(agent, vec![ChatMessage::user(prompt)], protocol))
    }

    pub fn analyze_changes(&self, request: ChangeAnalysisRequest) -> RedraftResult<FrameStream> {
        if request.original_text.trim().is_empty() || request.rewritten_text.trim().is_empty() {
            return Err(RedraftError::validation(MISSING_CHANGE_FIELDS));
        }

        info!("Starting change analysis");
        let context = request.context.as_ref();
        let agent = agents::change_analyzer(context);
        let prompt = prompts::change_analysis_prompt(&request.original_text, &request.rewritten_text, context);
        let protocol = ChangeAnalysisProtocol::new(request.original_text);
        Ok(self.start(agent, vec![ChatMessage::user(prompt)], protocol))
    }

    fn start<P>(&self, agent: AgentDefinition, conversation: Vec<ChatMessage>, protocol: P) -> FrameStream
    where
        P: CompletionProtocol + 'static,
    {
        let agent = agent.with_temperature(self.temperature);
        let source = self.runner.run(agent, conversation);
        CompletionStreamReader::new(protocol, self.idle_timeout).spawn(source, self.frame_buffer)
    }
}
