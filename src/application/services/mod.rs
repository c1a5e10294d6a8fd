pub mod health_service;
pub mod ingestion_service;
pub mod retrieval_service;
pub mod sql_agent;

pub use health_service::HealthService;
pub use ingestion_service::IngestionService;
pub use retrieval_service::RetrievalService;
pub use sql_agent::SqlGenerationAgent;
