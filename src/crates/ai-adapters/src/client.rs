use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::provider::{CompletionProvider, CompletionRequest, ProviderStream};
use crate::stream_handler::handle_openai_stream;

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub idle_timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Client for any server speaking the OpenAI `/chat/completions` streaming API.
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn with_client(client: reqwest::Client, config: OpenAIConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    pub fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": request.messages,
            "stream": true,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| tool.to_openai_value())
                    .collect(),
            );
        }
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        body
    }
}

#[async_trait]
impl CompletionProvider for OpenAIClient {
    async fn stream_completion(&self, request: CompletionRequest) -> anyhow::Result<ProviderStream> {
        let url = self.endpoint();
        let body = self.build_request_body(&request);
        debug!(
            "Starting chat completion: url={}, model={}, messages={}, tools={}",
            url,
            self.config.model,
            request.messages.len(),
            request.tools.len()
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(&body);
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| anyhow!("Chat completion request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            bail!("Provider returned {}: {}", status, error_text);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(handle_openai_stream(response, tx, self.config.idle_timeout));
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatMessage, ToolDefinition};

    #[test]
    fn request_body_includes_tools_only_when_present() {
        let client = OpenAIClient::new(OpenAIConfig {
            model: "test-model".into(),
            ..Default::default()
        });

        let mut request = CompletionRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            ..Default::default()
        };
        let body = client.build_request_body(&request);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body.get("tools").is_none());

        request.tools.push(ToolDefinition {
            name: "searchDocuments".into(),
            description: "search".into(),
            parameters: json!({ "type": "object" }),
        });
        let body = client.build_request_body(&request);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "searchDocuments");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAIClient::new(OpenAIConfig {
            base_url: "http://localhost:1234/v1/".into(),
            ..Default::default()
        });
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }
}
