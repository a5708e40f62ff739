//! LLM Gateway port
//!
//! Defines the interface for sending a single completion request to a
//! generation provider.

use agora_domain::DomainError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GenerationError {
    /// Whether a retry with backoff may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited(_) | GenerationError::ResourceExhausted(_)
        )
    }
}

impl From<DomainError> for GenerationError {
    fn from(e: DomainError) -> Self {
        GenerationError::MalformedResponse(e.to_string())
    }
}

/// Expected shape of the completion text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the provider for a JSON document
    Json,
}

/// One completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub format: ResponseFormat,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            format: ResponseFormat::Text,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.format = ResponseFormat::Json;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer communicates with LLM providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a completion request and return the generated text
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationError>;

    /// Model identifier used for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::RateLimited("429".into()).is_transient());
        assert!(GenerationError::ResourceExhausted("quota".into()).is_transient());
        assert!(!GenerationError::Rejected("safety".into()).is_transient());
        assert!(!GenerationError::Timeout.is_transient());
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("hi")
            .with_system("be brief")
            .json()
            .with_temperature(0.2);
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.format, ResponseFormat::Json);
        assert_eq!(request.temperature, Some(0.2));
    }
}
