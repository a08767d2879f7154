use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{DocumentSearch, RetrievalError, RetrievedDocument};

#[derive(Debug, Clone)]
pub struct VectorizeConfig {
    /// Full URL of the pipeline's retrieval endpoint.
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    documents: Vec<RetrievedDocument>,
}

/// Vectorize-style retrieval endpoint: `POST {question, numResults}` returning
/// `{documents: [...]}`.
#[derive(Debug, Clone)]
pub struct VectorizeClient {
    client: reqwest::Client,
    config: VectorizeConfig,
}

impl VectorizeClient {
    pub fn new(config: VectorizeConfig) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DocumentSearch for VectorizeClient {
    async fn retrieve_documents(
        &self,
        question: &str,
        num_results: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let mut request = self.client.post(&self.config.endpoint).json(&json!({
            "question": question,
            "numResults": num_results,
        }));
        if let Some(token) = self.config.access_token.as_deref().filter(|t| !t.is_empty()) {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: RetrievalResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        debug!("Retrieved {} documents", body.documents.len());
        Ok(body.documents)
    }
}
