//! Application configuration
//!
//! Loaded from TOML, then overridden from the environment. The file is looked
//! up at `--config`, then `REDRAFT_CONFIG`, then
//! `<config_dir>/redraft/config.toml`; with no file the defaults apply.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::util::errors::{RedraftError, RedraftResult};

pub const CONFIG_PATH_ENV: &str = "REDRAFT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub retrieval: RetrievalConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    /// Longest gap between two provider SSE events.
    pub idle_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: None,
            idle_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Retrieval endpoint; retrieval is disabled when unset.
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub num_results: usize,
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_token: None,
            num_results: 5,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub idle_timeout_secs: u64,
    pub frame_buffer: usize,
    pub max_agent_rounds: usize,
    /// Also recognize the pre-v1 analysis sentinels.
    pub legacy_marker_fallback: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 60,
            frame_buffer: 64,
            max_agent_rounds: 6,
            legacy_marker_fallback: true,
        }
    }
}

impl StreamConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl AppConfig {
    /// Loads the configuration from disk and the process environment.
    pub fn load(explicit_path: Option<&Path>) -> RedraftResult<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let mut config = match resolve_config_path(explicit_path, env) {
            Some(path) => {
                info!("Loading config: path={}", path.display());
                Self::from_file(&path)?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RedraftResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RedraftError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> RedraftResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Applies environment overrides. `lookup` returns the value of a
    /// variable; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = get("REDRAFT_LISTEN_ADDR") {
            self.server.listen_addr = addr;
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(model) = get("REDRAFT_MODEL") {
            self.provider.model = model;
        }
        if let Some(endpoint) = get("VECTORIZE_RETRIEVAL_ENDPOINT") {
            self.retrieval.endpoint = Some(endpoint);
        }
        if let Some(token) = get("VECTORIZE_ACCESS_TOKEN") {
            self.retrieval.access_token = Some(token);
        }
        if let Some(raw) = get("REDRAFT_STREAM_IDLE_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) => self.stream.idle_timeout_secs = secs,
                Err(_) => warn!(
                    "Ignoring REDRAFT_STREAM_IDLE_TIMEOUT_SECS: not a number: {}",
                    raw
                ),
            }
        }
    }

    pub fn validate(&self) -> RedraftResult<()> {
        self.listen_addr()?;
        if self.stream.idle_timeout_secs == 0 {
            return Err(RedraftError::config("stream.idle_timeout_secs must be positive"));
        }
        if self.stream.frame_buffer == 0 {
            return Err(RedraftError::config("stream.frame_buffer must be positive"));
        }
        if self.stream.max_agent_rounds == 0 {
            return Err(RedraftError::config("stream.max_agent_rounds must be positive"));
        }
        if self.provider.idle_timeout_secs == 0 {
            return Err(RedraftError::config("provider.idle_timeout_secs must be positive"));
        }
        if self.provider.model.trim().is_empty() {
            return Err(RedraftError::config("provider.model must not be empty"));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> RedraftResult<SocketAddr> {
        self.server.listen_addr.parse().map_err(|e| {
            RedraftError::config(format!(
                "Invalid server.listen_addr '{}': {}",
                self.server.listen_addr, e
            ))
        })
    }
}

/// Picks the config file: the explicit path, then `REDRAFT_CONFIG`, then the
/// per-user default if it exists.
pub fn resolve_config_path<F>(explicit_path: Option<&Path>, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }
    default_config_path().filter(|path| path.is_file())
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("redraft").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stream.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.stream.frame_buffer, 64);
        assert!(config.stream.legacy_marker_fallback);
        assert!(config.retrieval.endpoint.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [provider]
            model = "gpt-4o-mini"

            [stream]
            legacy_marker_fallback = false
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert!(!config.stream.legacy_marker_fallback);
        assert_eq!(config.stream.max_agent_rounds, 6);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = AppConfig::from_toml_str("[stream]\nframe_buffer = \"lots\"").unwrap_err();
        assert!(matches!(err, RedraftError::Config(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1"),
            ("REDRAFT_MODEL", "local-model"),
            ("REDRAFT_LISTEN_ADDR", "0.0.0.0:8080"),
            ("VECTORIZE_RETRIEVAL_ENDPOINT", "http://localhost:9998/retrieve"),
            ("VECTORIZE_ACCESS_TOKEN", "token"),
            ("REDRAFT_STREAM_IDLE_TIMEOUT_SECS", "15"),
        ]));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.base_url, "http://localhost:9999/v1");
        assert_eq!(config.provider.model, "local-model");
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(
            config.retrieval.endpoint.as_deref(),
            Some("http://localhost:9998/retrieve")
        );
        assert_eq!(config.retrieval.access_token.as_deref(), Some("token"));
        assert_eq!(config.stream.idle_timeout_secs, 15);
        config.validate().unwrap();
    }

    #[test]
    fn blank_or_unparsable_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env_of(&[
            ("OPENAI_API_KEY", "  "),
            ("REDRAFT_STREAM_IDLE_TIMEOUT_SECS", "soon"),
        ]));
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.stream.idle_timeout_secs, 60);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.server.listen_addr = "not-an-address".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.stream.frame_buffer = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.stream.max_agent_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        let explicit = PathBuf::from("/tmp/explicit.toml");
        let env = env_of(&[(CONFIG_PATH_ENV, "/tmp/from-env.toml")]);
        assert_eq!(
            resolve_config_path(Some(&explicit), &env),
            Some(explicit.clone())
        );
        assert_eq!(
            resolve_config_path(None, &env),
            Some(PathBuf::from("/tmp/from-env.toml"))
        );
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "redraft-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[server]\nlisten_addr = \"127.0.0.1:4555\"\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.listen_addr().unwrap().port(), 4555);
    }
}
