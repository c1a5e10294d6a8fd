pub mod embedding_record;
pub mod ingestion_report;
pub mod query;
pub mod retrieved_context;
pub mod schema_document;

pub use embedding_record::EmbeddingRecord;
pub use ingestion_report::IngestionReport;
pub use query::{QueryRequest, QueryResponse};
pub use retrieved_context::{RetrievedContext, ScoredDocument};
pub use schema_document::{ColumnDocument, RelationKind, SchemaDocument};
