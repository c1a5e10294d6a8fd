use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum LlmProviderError {
    NetworkError(String),
    ApiError(String),
    EmptyCompletion,
    RateLimitExceeded,
    ServiceUnavailable,
}

impl std::fmt::Display for LlmProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            LlmProviderError::EmptyCompletion => write!(f, "Provider returned no completion"),
            LlmProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            LlmProviderError::ServiceUnavailable => write!(f, "Service unavailable"),
        }
    }
}

impl std::error::Error for LlmProviderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion provider driving the SQL generation step.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmProviderError>;

    async fn health_check(&self) -> Result<bool, LlmProviderError>;

    fn model_name(&self) -> String;
}
