//! Infrastructure layer - builds the external clients from configuration

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use redraft_ai_adapters::{CompletionProvider, OpenAIClient, OpenAIConfig};
use redraft_services_integrations::{InstructionRetriever, VectorizeClient, VectorizeConfig};

use crate::service::config::{ProviderConfig, RetrievalConfig};
use crate::util::errors::RedraftResult;

pub fn build_provider(config: &ProviderConfig) -> Arc<dyn CompletionProvider> {
    if config.api_key.is_none() {
        warn!("No provider API key configured; requests are sent unauthenticated");
    }
    info!(
        "Completion provider: base_url={}, model={}",
        config.base_url, config.model
    );
    Arc::new(OpenAIClient::new(OpenAIConfig {
        base_url: config.base_url.clone(),
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        idle_timeout: Duration::from_secs(config.idle_timeout_secs),
    }))
}

/// Retrieval is disabled when no endpoint is configured.
pub fn build_retriever(config: &RetrievalConfig) -> RedraftResult<InstructionRetriever> {
    let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
        info!("No retrieval endpoint configured; document search is disabled");
        return Ok(InstructionRetriever::disabled());
    };

    let client = VectorizeClient::new(VectorizeConfig {
        endpoint: endpoint.to_string(),
        access_token: config.access_token.clone(),
        timeout: Duration::from_secs(config.timeout_secs.max(1)),
    })?;
    info!("Document retrieval enabled: endpoint={}", endpoint);
    Ok(InstructionRetriever::new(Arc::new(client), config.num_results))
}
