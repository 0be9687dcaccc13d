//! Generation gateway port
//!
//! Defines the interface to the language-generation capability used by the
//! GP and by every specialist.

use async_trait::async_trait;
use interconsult_domain::{GenerationResponse, Message, Model, ToolDefinition};
use thiserror::Error;

/// Errors that can occur during generation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Generation unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Transient errors worth retrying with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable(_) | GatewayError::RateLimited(_) | GatewayError::Timeout
        )
    }
}

/// One generation turn: system prompt, offered tools and conversation so far
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: Model,
    pub system_prompt: String,
    pub tools: Vec<ToolDefinition>,
    pub history: Vec<Message>,
}

impl GenerationRequest {
    pub fn new(model: Model, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// Gateway to the generation capability
///
/// Returns either tool invocations or free text. Implementations (adapters)
/// live in the infrastructure layer.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(GatewayError::Unavailable("503".into()).is_retryable());
        assert!(GatewayError::RateLimited("429".into()).is_retryable());
        assert!(GatewayError::Timeout.is_retryable());
        assert!(!GatewayError::MalformedOutput("bad json".into()).is_retryable());
        assert!(!GatewayError::RequestFailed("401".into()).is_retryable());
    }
}
