use std::sync::Arc;

use crate::{
    application::{
        ports::{EmbeddingProvider, LlmProvider, SqlExecutor},
        services::{HealthService, IngestionService, RetrievalService, SqlGenerationAgent},
        use_cases::{AnswerQuestionUseCase, RefreshIndexUseCase},
    },
    domain::repositories::{SchemaRepository, VectorIndex},
    infrastructure::{
        config::{AppConfig, VectorBackend},
        database::{
            PostgresSqlExecutor, create_connection_pool, get_connection_from_pool,
            repositories::{PgVectorIndex, PostgresSchemaRepository},
            run_migrations,
        },
        external_services::{OpenAiClient, OpenAiEmbeddingProvider, OpenAiLlmProvider},
        vector::InMemoryVectorIndex,
    },
    presentation::http::handlers::{HealthHandler, IngestHandler, QueryHandler},
};

/// Constructed once at startup and handed to the server; everything
/// downstream receives its dependencies by parameter instead of
/// reaching for process-wide state.
pub struct AppContainer {
    // Repositories
    pub schema_repository: Arc<dyn SchemaRepository>,
    pub vector_index: Arc<dyn VectorIndex>,

    // External Services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub llm_provider: Arc<dyn LlmProvider>,
    pub sql_executor: Arc<dyn SqlExecutor>,

    // Application Services
    pub ingestion_service: Arc<IngestionService>,
    pub retrieval_service: Arc<RetrievalService>,
    pub sql_agent: Arc<SqlGenerationAgent>,
    pub health_service: Arc<HealthService>,

    // Use Cases
    pub answer_question_use_case: Arc<AnswerQuestionUseCase>,
    pub refresh_index_use_case: Arc<RefreshIndexUseCase>,

    // HTTP Handlers
    pub query_handler: Arc<QueryHandler>,
    pub ingest_handler: Arc<IngestHandler>,
    pub health_handler: Arc<HealthHandler>,

    pub config: AppConfig,
}

impl AppContainer {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Create database connection pool and bring the vector table up
        let db_pool = create_connection_pool(&config.database_url)?;
        {
            let mut conn = get_connection_from_pool(&db_pool)
                .map_err(|e| format!("Failed to get database connection: {}", e))?;
            run_migrations(&mut conn)
                .map_err(|e| format!("Failed to run database migrations: {}", e))?;
        }

        // Create external service clients
        let openai_client = Arc::new(OpenAiClient::from_env()?);
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(OpenAiEmbeddingProvider::new(openai_client.clone()));
        let llm_provider: Arc<dyn LlmProvider> =
            Arc::new(OpenAiLlmProvider::new(openai_client.clone()));
        let sql_executor: Arc<dyn SqlExecutor> =
            Arc::new(PostgresSqlExecutor::new(config.database_url.clone()));

        // Create repositories
        let schema_repository: Arc<dyn SchemaRepository> = Arc::new(PostgresSchemaRepository::new(
            db_pool.clone(),
            config.include_schemas.clone(),
        ));

        let dimension = embedding_provider.embedding_dimension();
        let vector_index: Arc<dyn VectorIndex> = match config.vector_backend {
            VectorBackend::Postgres => Arc::new(PgVectorIndex::new(db_pool, dimension)),
            VectorBackend::Memory => Arc::new(InMemoryVectorIndex::new(dimension)),
        };

        // Create application services
        let ingestion_service = Arc::new(IngestionService::new(
            schema_repository.clone(),
            embedding_provider.clone(),
            vector_index.clone(),
        ));
        let retrieval_service = Arc::new(RetrievalService::new(
            embedding_provider.clone(),
            vector_index.clone(),
        ));
        let sql_agent = Arc::new(SqlGenerationAgent::new(
            llm_provider.clone(),
            sql_executor.clone(),
            config.max_sql_attempts,
        ));
        let health_service = Arc::new(HealthService::new(
            embedding_provider.clone(),
            llm_provider.clone(),
            sql_executor.clone(),
            vector_index.clone(),
        ));

        // Create use cases
        let answer_question_use_case = Arc::new(AnswerQuestionUseCase::new(
            retrieval_service.clone(),
            sql_agent.clone(),
            config.top_k,
        ));
        let refresh_index_use_case =
            Arc::new(RefreshIndexUseCase::new(ingestion_service.clone()));

        // Create HTTP handlers
        let query_handler = Arc::new(QueryHandler::new(answer_question_use_case.clone()));
        let ingest_handler = Arc::new(IngestHandler::new(refresh_index_use_case.clone()));
        let health_handler = Arc::new(HealthHandler::new(health_service.clone()));

        Ok(Self {
            schema_repository,
            vector_index,
            embedding_provider,
            llm_provider,
            sql_executor,
            ingestion_service,
            retrieval_service,
            sql_agent,
            health_service,
            answer_question_use_case,
            refresh_index_use_case,
            query_handler,
            ingest_handler,
            health_handler,
            config,
        })
    }
}
