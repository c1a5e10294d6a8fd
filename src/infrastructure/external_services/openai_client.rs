use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::embedding_provider::{EmbeddingProvider, EmbeddingProviderError};
use crate::application::ports::llm_provider::{ChatMessage, LlmProvider, LlmProviderError};

#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_dimension: usize,
    pub temperature: f32,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_factor: f64,
}

impl OpenAiClientConfig {
    pub fn from_env() -> Result<Self, OpenAiClientError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAiClientError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        Ok(Self {
            api_key,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-ada-002".to_string()),
            chat_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            embedding_dimension: env::var("EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1536),
            temperature: 0.0,
            max_retries: 3,
            timeout_secs: 60,
            backoff_factor: 1.5,
        })
    }
}

#[derive(Debug)]
pub enum OpenAiClientError {
    Configuration(String),
    ClientBuild(String),
}

impl std::fmt::Display for OpenAiClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenAiClientError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OpenAiClientError::ClientBuild(msg) => write!(f, "Client build error: {}", msg),
        }
    }
}

impl std::error::Error for OpenAiClientError {}

#[derive(Debug)]
enum RequestError {
    Network(String),
    Api(String),
    Parse(String),
    RateLimited,
    MaxRetriesExceeded(String),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Network(msg) => write!(f, "Network error: {}", msg),
            RequestError::Api(msg) => write!(f, "API error: {}", msg),
            RequestError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RequestError::RateLimited => write!(f, "Rate limited"),
            RequestError::MaxRetriesExceeded(msg) => write!(f, "Max retries exceeded: {}", msg),
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsApiRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsApiResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Shared HTTP client for an OpenAI-compatible API, covering both the
/// embeddings and the chat-completions endpoints. Transient failures are
/// retried with exponential backoff.
pub struct OpenAiClient {
    client: Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiClientConfig) -> Result<Self, OpenAiClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OpenAiClientError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, OpenAiClientError> {
        Self::new(OpenAiClientConfig::from_env()?)
    }

    pub fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }

    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    pub fn embedding_dimension(&self) -> usize {
        self.config.embedding_dimension
    }

    async fn embeddings(&self, input: &[String]) -> Result<Vec<Vec<f32>>, RequestError> {
        let url = format!("{}/embeddings", self.config.base_url);
        let body = EmbeddingsApiRequest {
            model: &self.config.embedding_model,
            input,
        };

        let response: EmbeddingsApiResponse = self
            .send_with_retry(|| self.client.post(&url).json(&body))
            .await?;

        let mut data = response.data;
        data.sort_by_key(|object| object.index);
        Ok(data.into_iter().map(|object| object.embedding).collect())
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, RequestError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatCompletionsRequest {
            model: &self.config.chat_model,
            messages,
            temperature: self.config.temperature,
        };

        let response: ChatCompletionsResponse = self
            .send_with_retry(|| self.client.post(&url).json(&body))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RequestError::Api("Response contained no completion".to_string()))
    }

    async fn list_models(&self) -> Result<(), RequestError> {
        let url = format!("{}/models", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| RequestError::Network(e.without_url().to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RequestError::Api(format!("Status {}", response.status())))
        }
    }

    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, RequestError>
    where
        T: for<'de> Deserialize<'de>,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempts = 0;
        let mut last_error = None;

        loop {
            attempts += 1;

            match self.execute_request(build()).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    let retryable = matches!(
                        e,
                        RequestError::Network(_) | RequestError::RateLimited
                    );
                    last_error = Some(e);

                    if !retryable || attempts > self.config.max_retries {
                        break;
                    }

                    let backoff = Duration::from_millis(
                        (self.config.backoff_factor.powi(attempts as i32 - 1) * 1000.0) as u64,
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RequestError::MaxRetriesExceeded("Max retries exceeded".to_string())))
    }

    async fn execute_request<T>(&self, request: reqwest::RequestBuilder) -> Result<T, RequestError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| RequestError::Network(e.without_url().to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| RequestError::Parse(e.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(RequestError::RateLimited),
            status => {
                let detail = response.text().await.unwrap_or_default();
                Err(RequestError::Api(format!("Status {}: {}", status, detail)))
            }
        }
    }
}

// Adapter implementing the EmbeddingProvider port
pub struct OpenAiEmbeddingProvider {
    client: Arc<OpenAiClient>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

fn to_embedding_error(error: RequestError) -> EmbeddingProviderError {
    match error {
        RequestError::Network(msg) => EmbeddingProviderError::NetworkError(msg),
        RequestError::Api(msg) | RequestError::Parse(msg) => EmbeddingProviderError::ApiError(msg),
        RequestError::RateLimited => EmbeddingProviderError::RateLimitExceeded,
        RequestError::MaxRetriesExceeded(_) => EmbeddingProviderError::ServiceUnavailable,
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vector, EmbeddingProviderError> {
        if text.trim().is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }

        let input = vec![text.to_string()];
        let vectors = self
            .client
            .embeddings(&input)
            .await
            .map_err(to_embedding_error)?;

        vectors
            .into_iter()
            .next()
            .map(Vector::from)
            .ok_or_else(|| EmbeddingProviderError::ApiError("No embeddings returned".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .client
            .embeddings(texts)
            .await
            .map_err(to_embedding_error)?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        Ok(vectors.into_iter().map(Vector::from).collect())
    }

    async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
        // Probe by embedding a test string, as a live end-to-end check.
        match self.embed("health check").await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> String {
        self.client.embedding_model().to_string()
    }

    fn embedding_dimension(&self) -> usize {
        self.client.embedding_dimension()
    }
}

// Adapter implementing the LlmProvider port
pub struct OpenAiLlmProvider {
    client: Arc<OpenAiClient>,
}

impl OpenAiLlmProvider {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlmProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmProviderError> {
        let completion = self.client.chat(messages).await.map_err(|e| match e {
            RequestError::Network(msg) => LlmProviderError::NetworkError(msg),
            RequestError::Api(msg) | RequestError::Parse(msg) => LlmProviderError::ApiError(msg),
            RequestError::RateLimited => LlmProviderError::RateLimitExceeded,
            RequestError::MaxRetriesExceeded(_) => LlmProviderError::ServiceUnavailable,
        })?;

        if completion.trim().is_empty() {
            return Err(LlmProviderError::EmptyCompletion);
        }

        Ok(completion)
    }

    async fn health_check(&self) -> Result<bool, LlmProviderError> {
        match self.client.list_models().await {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn model_name(&self) -> String {
        self.client.chat_model().to_string()
    }
}
