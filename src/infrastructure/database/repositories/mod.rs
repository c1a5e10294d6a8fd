pub mod pgvector_index;
pub mod postgres_schema_repository;

pub use pgvector_index::PgVectorIndex;
pub use postgres_schema_repository::PostgresSchemaRepository;
