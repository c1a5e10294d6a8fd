pub mod health_handler;
pub mod ingest_handler;
pub mod query_handler;

pub use health_handler::HealthHandler;
pub use ingest_handler::IngestHandler;
pub use query_handler::QueryHandler;
