//! Agent runner: the provider round / tool execution loop

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, error, warn};
use redraft_agent_stream::{CompletionEvent, CompletionSource, ToolOutcome};
use redraft_ai_adapters::{
    AssembledToolCall, ChatMessage, CompletionProvider, CompletionRequest, ToolCall,
    ToolCallAccumulator,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::agents::AgentDefinition;

type EventSender = mpsc::UnboundedSender<anyhow::Result<CompletionEvent>>;

/// Drives one agent against a provider.
///
/// Each round streams one completion; text is forwarded as it arrives and the
/// tool calls requested in that round are executed before the next round.
/// The run ends when a round requests no tools, a terminal tool succeeds, or
/// `max_rounds` is reached.
#[derive(Clone)]
pub struct AgentRunner {
    provider: Arc<dyn CompletionProvider>,
    max_rounds: usize,
}

/// How a single round ended.
enum RoundEnd {
    Finished,
    Continue,
    /// The consumer or the provider went away; nothing more to send.
    Stopped,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn CompletionProvider>, max_rounds: usize) -> Self {
        Self {
            provider,
            max_rounds: max_rounds.max(1),
        }
    }

    /// Starts the agent on its own task and returns its event stream.
    pub fn run(&self, agent: AgentDefinition, conversation: Vec<ChatMessage>) -> CompletionSource {
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = self.clone();
        tokio::spawn(async move {
            runner.drive(agent, conversation, tx).await;
        });
        UnboundedReceiverStream::new(rx).boxed()
    }

    async fn drive(&self, agent: AgentDefinition, conversation: Vec<ChatMessage>, tx: EventSender) {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(agent.instructions.clone()));
        messages.extend(conversation);

        for round in 1..=self.max_rounds {
            debug!("Agent round started: agent={}, round={}", agent.name, round);
            match self.round(&agent, &mut messages, &tx).await {
                RoundEnd::Finished => {
                    let _ = tx.send(Ok(CompletionEvent::End));
                    return;
                }
                RoundEnd::Continue => {}
                RoundEnd::Stopped => return,
            }
        }

        warn!(
            "Agent stopped after reaching the round limit: agent={}, max_rounds={}",
            agent.name, self.max_rounds
        );
        let _ = tx.send(Ok(CompletionEvent::End));
    }

    async fn round(
        &self,
        agent: &AgentDefinition,
        messages: &mut Vec<ChatMessage>,
        tx: &EventSender,
    ) -> RoundEnd {
        let request = CompletionRequest {
            messages: messages.clone(),
            tools: agent.tools.definitions(),
            temperature: agent.temperature,
        };

        let mut stream = match self.provider.stream_completion(request).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Provider request failed: agent={}, error={}", agent.name, e);
                let _ = tx.send(Err(e));
                return RoundEnd::Stopped;
            }
        };

        let mut text = String::new();
        let mut tool_calls = ToolCallAccumulator::new();

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    debug!("Agent event consumer dropped: agent={}", agent.name);
                    return RoundEnd::Stopped;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(delta)) => {
                    if let Some(fragment) = delta.text.filter(|t| !t.is_empty()) {
                        text.push_str(&fragment);
                        if tx.send(Ok(CompletionEvent::Text(fragment))).is_err() {
                            return RoundEnd::Stopped;
                        }
                    }
                    if let Some(call) = delta.tool_call {
                        tool_calls.push(call);
                    }
                }
                Some(Err(e)) => {
                    let _ = tx.send(Err(e));
                    return RoundEnd::Stopped;
                }
                None => break,
            }
        }
        drop(stream);

        let calls = tool_calls.finish();
        if calls.is_empty() {
            return RoundEnd::Finished;
        }

        messages.push(ChatMessage::assistant_tool_calls(
            Some(text),
            calls
                .iter()
                .map(|call| ToolCall::function(&call.id, &call.name, &call.arguments))
                .collect(),
        ));

        let mut terminal = false;
        for call in &calls {
            let (outcome, succeeded_terminal) = execute_tool(agent, call).await;
            messages.push(ChatMessage::tool_result(&call.id, &outcome.output));
            terminal |= succeeded_terminal;
            if tx.send(Ok(CompletionEvent::ToolResult(outcome))).is_err() {
                return RoundEnd::Stopped;
            }
        }

        if terminal {
            RoundEnd::Finished
        } else {
            RoundEnd::Continue
        }
    }
}

/// Runs one requested tool. Failures become the tool output so the model can
/// correct itself in the next round.
async fn execute_tool(agent: &AgentDefinition, call: &AssembledToolCall) -> (ToolOutcome, bool) {
    let arguments = match call.parse_arguments() {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!("Malformed tool arguments: tool={}, error={}", call.name, e);
            return (
                ToolOutcome {
                    name: call.name.clone(),
                    arguments: Value::String(call.arguments.clone()),
                    output: format!("Invalid arguments for {}: {}", call.name, e),
                },
                false,
            );
        }
    };

    let Some(tool) = agent.tools.get(&call.name) else {
        warn!("Unknown tool requested: agent={}, tool={}", agent.name, call.name);
        return (
            ToolOutcome {
                name: call.name.clone(),
                arguments,
                output: format!("Unknown tool: {}", call.name),
            },
            false,
        );
    };

    debug!("Executing tool: tool={}", call.name);
    match tool.call(&arguments).await {
        Ok(output) => (
            ToolOutcome {
                name: call.name.clone(),
                arguments,
                output,
            },
            tool.is_terminal(),
        ),
        Err(e) => {
            warn!("Tool failed: tool={}, error={}", call.name, e);
            (
                ToolOutcome {
                    name: call.name.clone(),
                    arguments,
                    output: format!("Tool {} failed: {}", call.name, e),
                },
                false,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentic::tools::{Tool, ToolSet};
    use crate::util::errors::RedraftResult;
    use async_trait::async_trait;
    use redraft_ai_adapters::{ProviderStream, UnifiedResponse, UnifiedToolCall};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Rounds {
        rounds: Mutex<VecDeque<Vec<UnifiedResponse>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionProvider for Rounds {
        async fn stream_completion(&self, request: CompletionRequest) -> anyhow::Result<ProviderStream> {
            self.requests.lock().unwrap().push(request);
            let deltas = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
            Ok(futures::stream::iter(deltas.into_iter().map(Ok)).boxed())
        }
    }

    fn rounds(rounds: Vec<Vec<UnifiedResponse>>) -> Arc<Rounds> {
        Arc::new(Rounds {
            rounds: Mutex::new(rounds.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn text(fragment: &str) -> UnifiedResponse {
        UnifiedResponse {
            text: Some(fragment.to_string()),
            ..Default::default()
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> UnifiedResponse {
        UnifiedResponse {
            tool_call: Some(UnifiedToolCall {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                arguments: Some(arguments.to_string()),
            }),
            ..Default::default()
        }
    }

    struct Echo {
        terminal: bool,
    }

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            if self.terminal {
                "finish"
            } else {
                "echo"
            }
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn input_schema(&self) -> Value {
            serde_json::json!({ "type": "object" })
        }

        fn is_terminal(&self) -> bool {
            self.terminal
        }

        async fn call(&self, input: &Value) -> RedraftResult<String> {
            Ok(format!("echo {}", input))
        }
    }

    fn agent() -> AgentDefinition {
        AgentDefinition {
            name: "test",
            instructions: "be helpful".to_string(),
            tools: ToolSet::new()
                .with(Arc::new(Echo { terminal: false }))
                .with(Arc::new(Echo { terminal: true })),
            temperature: None,
        }
    }

    async fn events(provider: Arc<Rounds>, max_rounds: usize) -> Vec<CompletionEvent> {
        AgentRunner::new(provider, max_rounds)
            .run(agent(), vec![ChatMessage::user("hi")])
            .map(|event| event.expect("no errors expected"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn tool_results_feed_the_next_round() {
        let provider = rounds(vec![
            vec![text("Looking"), call("c1", "echo", "{\"q\":1}")],
            vec![text(" done.")],
        ]);
        let events = events(provider.clone(), 4).await;

        assert_eq!(events[0], CompletionEvent::Text("Looking".into()));
        assert!(matches!(&events[1], CompletionEvent::ToolResult(outcome)
            if outcome.name == "echo" && outcome.output == "echo {\"q\":1}"));
        assert_eq!(events[2], CompletionEvent::Text(" done.".into()));
        assert_eq!(events[3], CompletionEvent::End);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        assert_eq!(second[0].content.as_deref(), Some("be helpful"));
        assert_eq!(second[2].tool_calls[0].id, "c1");
        assert_eq!(second[2].content.as_deref(), Some("Looking"));
        assert_eq!(second[3].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(requests[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn terminal_tool_ends_the_run() {
        let provider = rounds(vec![
            vec![call("c1", "finish", "{}")],
            vec![text("never requested")],
        ]);
        let events = events(provider.clone(), 4).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], CompletionEvent::ToolResult(o) if o.name == "finish"));
        assert_eq!(events[1], CompletionEvent::End);
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tools_and_bad_arguments_are_reported_to_the_model() {
        let provider = rounds(vec![
            vec![call("c1", "nope", "{}"), call("c2", "echo", "{broken")],
            vec![],
        ]);
        let events = events(provider, 4).await;
        let outputs: Vec<&str> = events
            .iter()
            .filter_map(|event| match event {
                CompletionEvent::ToolResult(outcome) => Some(outcome.output.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], "Unknown tool: nope");
        assert!(outputs[1].starts_with("Invalid arguments for echo"));
    }

    #[tokio::test]
    async fn round_limit_is_enforced() {
        let provider = rounds(vec![
            vec![call("c1", "echo", "{}")],
            vec![call("c2", "echo", "{}")],
            vec![call("c3", "echo", "{}")],
        ]);
        let events = events(provider.clone(), 2).await;
        assert_eq!(events.last(), Some(&CompletionEvent::End));
        assert_eq!(provider.requests.lock().unwrap().len(), 2);
    }

    struct Refusing;

    #[async_trait]
    impl CompletionProvider for Refusing {
        async fn stream_completion(&self, _request: CompletionRequest) -> anyhow::Result<ProviderStream> {
            anyhow::bail!("Provider returned 401 Unauthorized: bad key")
        }
    }

    #[tokio::test]
    async fn provider_errors_are_forwarded() {
        let items: Vec<anyhow::Result<CompletionEvent>> = AgentRunner::new(Arc::new(Refusing), 3)
            .run(agent(), vec![ChatMessage::user("hi")])
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0]
            .as_ref()
            .is_err_and(|e| e.to_string().contains("401")));
    }
}
