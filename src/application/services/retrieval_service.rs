use std::sync::Arc;

use crate::application::ports::EmbeddingProvider;
use crate::domain::entities::RetrievedContext;
use crate::domain::repositories::VectorIndex;

#[derive(Debug)]
pub enum RetrievalError {
    EmbeddingError(String),
    IndexError(String),
}

impl std::fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            RetrievalError::IndexError(msg) => write!(f, "Index error: {}", msg),
        }
    }
}

impl std::error::Error for RetrievalError {}

pub struct RetrievalService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
}

impl RetrievalService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedding_provider,
            vector_index,
        }
    }

    /// Embeds `question` and returns the `k` most similar schema
    /// documents in descending similarity order. An empty index yields an
    /// empty context; downstream generation handles that case.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
    ) -> Result<RetrievedContext, RetrievalError> {
        let query_vector = self
            .embedding_provider
            .embed(question)
            .await
            .map_err(|e| RetrievalError::EmbeddingError(e.to_string()))?;

        let scored = self
            .vector_index
            .query(&query_vector, k)
            .await
            .map_err(|e| RetrievalError::IndexError(e.to_string()))?;

        if scored.is_empty() {
            tracing::info!("No relevant schema documents found in vector index");
        }

        Ok(RetrievedContext::new(scored))
    }
}
