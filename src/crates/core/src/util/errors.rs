//! Error types for the Redraft core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedraftError {
    /// Rejected input; the HTTP layer answers 400.
    #[error("{0}")]
    Validation(String),

    #[error("AI client error: {0}")]
    AIClient(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type RedraftResult<T> = Result<T, RedraftError>;

impl RedraftError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn ai_client(msg: impl Into<String>) -> Self {
        Self::AIClient(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<anyhow::Error> for RedraftError {
    fn from(err: anyhow::Error) -> Self {
        Self::AIClient(err.to_string())
    }
}

impl From<toml::de::Error> for RedraftError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<redraft_services_integrations::RetrievalError> for RedraftError {
    fn from(err: redraft_services_integrations::RetrievalError) -> Self {
        Self::Retrieval(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = RedraftError::validation("Invalid message format");
        assert_eq!(err.to_string(), "Invalid message format");
        assert!(err.is_validation());
    }

    #[test]
    fn io_errors_convert() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RedraftError = io_err.into();
        assert!(matches!(err, RedraftError::Io(_)));
        assert!(!err.is_validation());
    }
}
