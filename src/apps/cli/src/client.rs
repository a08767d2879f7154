use anyhow::{anyhow, Context};
use futures::stream::BoxStream;
use futures::StreamExt;
use log::debug;
use redraft_core_types::StreamFrame;
use redraft_transport::{decode_frames, TransportError};
use serde::Serialize;
use serde_json::Value;

pub type FrameResults = BoxStream<'static, Result<StreamFrame, TransportError>>;

/// HTTP client for a Redraft server.
#[derive(Debug, Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts `body` to a streaming endpoint. A non-2xx answer is returned as
    /// an error carrying the server's `error` message.
    pub async fn stream<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> anyhow::Result<FrameResults> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(anyhow!("Server returned {}: {}", status, message));
        }

        Ok(decode_frames(response.bytes_stream()).boxed())
    }
}
