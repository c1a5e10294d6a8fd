use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::ports::{EmbeddingProvider, LlmProvider, SqlExecutor};
use crate::domain::repositories::VectorIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateStatus {
    Ok,
    Degraded,
    Error,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Ok => "ok",
            AggregateStatus::Degraded => "degraded",
            AggregateStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub status: AggregateStatus,
    pub services: BTreeMap<String, String>,
}

/// Probes every dependency live on each call; verdicts are never cached
/// across requests. Retriever and agent statuses are derived from the
/// dependencies they are composed of.
pub struct HealthService {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    llm_provider: Arc<dyn LlmProvider>,
    sql_executor: Arc<dyn SqlExecutor>,
    vector_index: Arc<dyn VectorIndex>,
}

impl HealthService {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        sql_executor: Arc<dyn SqlExecutor>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            embedding_provider,
            llm_provider,
            sql_executor,
            vector_index,
        }
    }

    pub async fn check(&self) -> HealthStatus {
        let (llm, embedder, database, index) = futures::join!(
            self.probe_llm(),
            self.probe_embedder(),
            self.probe_database(),
            self.probe_vector_index(),
        );

        let retriever = derive_status(&[&embedder, &index]);
        let agent = derive_status(&[&llm, &database]);

        let mut services = BTreeMap::new();
        services.insert("llm".to_string(), llm.clone());
        services.insert("embeddings_model".to_string(), embedder.clone());
        services.insert("database_connection".to_string(), database.clone());
        services.insert("vector_store".to_string(), index.clone());
        services.insert("retriever".to_string(), retriever);
        services.insert("sql_agent".to_string(), agent);

        let probes = [&llm, &embedder, &database, &index];
        let healthy = probes.iter().filter(|s| is_ok(s.as_str())).count();
        let status = if healthy == probes.len() {
            AggregateStatus::Ok
        } else if healthy > 0 {
            AggregateStatus::Degraded
        } else {
            AggregateStatus::Error
        };

        HealthStatus { status, services }
    }

    async fn probe_llm(&self) -> String {
        match self.llm_provider.health_check().await {
            Ok(true) => "OK".to_string(),
            Ok(false) => "Error: provider unreachable".to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn probe_embedder(&self) -> String {
        match self.embedding_provider.health_check().await {
            Ok(true) => "OK".to_string(),
            Ok(false) => "Error: provider unreachable".to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn probe_database(&self) -> String {
        match self.sql_executor.health_check().await {
            Ok(()) => "OK".to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn probe_vector_index(&self) -> String {
        match self.vector_index.count().await {
            Ok(0) => "OK (empty)".to_string(),
            Ok(count) => format!("OK ({} documents)", count),
            Err(e) => format!("Error: {}", e),
        }
    }
}

fn is_ok(status: &str) -> bool {
    status.starts_with("OK")
}

fn derive_status(dependencies: &[&String]) -> String {
    if dependencies.iter().all(|s| is_ok(s.as_str())) {
        "OK".to_string()
    } else {
        "Error: dependency unavailable".to_string()
    }
}
