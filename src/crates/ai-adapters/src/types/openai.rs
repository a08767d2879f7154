use super::unified::{UnifiedResponse, UnifiedTokenUsage, UnifiedToolCall};
use serde::Deserialize;
use serde_json::Value;

pub const OPENAI_CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";

/// Providers that proxy OpenAI sometimes interleave their own events; only
/// `chat.completion.chunk` objects are parsed.
pub fn is_valid_chat_completion_chunk_weak(event_json: &Value) -> bool {
    matches!(
        event_json.get("object").and_then(|value| value.as_str()),
        Some(OPENAI_CHAT_COMPLETION_CHUNK_OBJECT)
    )
}

pub fn extract_sse_api_error_message(event_json: &Value) -> Option<String> {
    let error = event_json.get("error")?;
    if let Some(message) = error.get("message").and_then(|value| value.as_str()) {
        return Some(message.to_string());
    }
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    Some("An error occurred during streaming".to_string())
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAIUsage> for UnifiedTokenUsage {
    fn from(usage: OpenAIUsage) -> Self {
        Self {
            prompt_token_count: usage.prompt_tokens,
            candidates_token_count: usage.completion_tokens,
            total_token_count: usage.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize, Clone)]
struct OpenAIToolCall {
    id: Option<String>,
    function: Option<FunctionCall>,
}

impl From<OpenAIToolCall> for UnifiedToolCall {
    fn from(tool_call: OpenAIToolCall) -> Self {
        let (name, arguments) = match tool_call.function {
            Some(function) => (function.name, function.arguments),
            None => (None, None),
        };
        Self {
            id: tool_call.id.filter(|id| !id.is_empty()),
            name: name.filter(|name| !name.is_empty()),
            arguments,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct FunctionCall {
    name: Option<String>,
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAISSEData {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<OpenAIUsage>,
}

impl OpenAISSEData {
    pub fn is_choices_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Splits one chunk into unified deltas: text first, then one delta per
    /// tool-call fragment. Usage and finish reason ride on the first delta.
    pub fn into_unified_responses(self) -> Vec<UnifiedResponse> {
        let mut usage = self.usage.map(|usage| usage.into());

        let Some(first_choice) = self.choices.into_iter().next() else {
            // OpenAI can emit `choices: []` for the final usage chunk.
            return usage
                .map(|usage_data| {
                    vec![UnifiedResponse {
                        usage: Some(usage_data),
                        ..Default::default()
                    }]
                })
                .unwrap_or_default();
        };

        let Choice {
            delta,
            mut finish_reason,
        } = first_choice;
        let Delta {
            content,
            tool_calls,
        } = delta;

        let mut responses = Vec::new();

        if content.as_deref().is_some_and(|c| !c.is_empty()) {
            responses.push(UnifiedResponse {
                text: content,
                tool_call: None,
                usage: usage.take(),
                finish_reason: finish_reason.take(),
            });
        }

        for tool_call in tool_calls.unwrap_or_default() {
            let is_first_event = responses.is_empty();
            responses.push(UnifiedResponse {
                text: None,
                tool_call: Some(UnifiedToolCall::from(tool_call)),
                usage: if is_first_event { usage.take() } else { None },
                finish_reason: if is_first_event {
                    finish_reason.take()
                } else {
                    None
                },
            });
        }

        if responses.is_empty() && (usage.is_some() || finish_reason.is_some()) {
            responses.push(UnifiedResponse {
                text: None,
                tool_call: None,
                usage,
                finish_reason,
            });
        }

        responses
    }
}
