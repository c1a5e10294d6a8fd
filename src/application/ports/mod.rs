pub mod embedding_provider;
pub mod llm_provider;
pub mod sql_executor;

pub use embedding_provider::EmbeddingProvider;
pub use llm_provider::LlmProvider;
pub use sql_executor::SqlExecutor;
