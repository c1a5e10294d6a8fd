pub mod schema_repository;
pub mod vector_index;

pub use schema_repository::SchemaRepository;
pub use vector_index::VectorIndex;
