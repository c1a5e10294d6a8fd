use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::{EmbeddingRecord, ScoredDocument};

#[derive(Debug)]
pub enum VectorIndexError {
    ConnectionError(String),
    StorageError(String),
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for VectorIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorIndexError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            VectorIndexError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            VectorIndexError::DimensionMismatch { expected, actual } => write!(
                f,
                "Vector dimension mismatch: expected {}, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for VectorIndexError {}

/// Nearest-neighbor store for schema embeddings. Single writer
/// (`rebuild`, during ingestion), many concurrent readers; readers must
/// never observe a partially rebuilt index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replaces the entire index contents. An empty record set is valid
    /// and leaves an empty index.
    async fn rebuild(&self, records: Vec<EmbeddingRecord>) -> Result<(), VectorIndexError>;

    /// Up to `k` documents nearest to `query`, by descending cosine
    /// similarity. Equal scores keep the index's stable insertion order.
    async fn query(&self, query: &Vector, k: usize)
        -> Result<Vec<ScoredDocument>, VectorIndexError>;

    async fn is_empty(&self) -> Result<bool, VectorIndexError>;

    async fn count(&self) -> Result<usize, VectorIndexError>;
}
