use async_trait::async_trait;

use crate::domain::entities::SchemaDocument;

#[derive(Debug)]
pub enum SchemaRepositoryError {
    ConnectionError(String),
    QueryError(String),
}

impl std::fmt::Display for SchemaRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaRepositoryError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            SchemaRepositoryError::QueryError(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for SchemaRepositoryError {}

/// Catalog introspection for the target database. Produces exactly one
/// SchemaDocument per relation visible to the configured role; an empty
/// catalog yields an empty collection, not an error.
#[async_trait]
pub trait SchemaRepository: Send + Sync {
    async fn load_schema_documents(&self) -> Result<Vec<SchemaDocument>, SchemaRepositoryError>;

    async fn health_check(&self) -> Result<(), SchemaRepositoryError>;
}
