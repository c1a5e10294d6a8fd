use std::sync::Arc;

use crate::application::services::{RetrievalService, SqlGenerationAgent};
use crate::domain::entities::{QueryRequest, QueryResponse, RetrievedContext};

/// Orchestrates one question: context retrieval, then the SQL generation
/// agent, assembled into the externally visible response. Never returns
/// an error to its caller; every failure path lands in
/// `QueryResponse.error`.
pub struct AnswerQuestionUseCase {
    retrieval_service: Arc<RetrievalService>,
    sql_agent: Arc<SqlGenerationAgent>,
    top_k: usize,
}

impl AnswerQuestionUseCase {
    pub fn new(
        retrieval_service: Arc<RetrievalService>,
        sql_agent: Arc<SqlGenerationAgent>,
        top_k: usize,
    ) -> Self {
        Self {
            retrieval_service,
            sql_agent,
            top_k: top_k.max(1),
        }
    }

    pub async fn execute(&self, request: QueryRequest) -> QueryResponse {
        let question = request.natural_language_query.clone();

        if !request.is_valid() {
            return QueryResponse::failure(
                question,
                None,
                String::new(),
                "Natural language query must not be empty".to_string(),
            );
        }

        tracing::info!(query = %question, "Handling natural language query");

        // Retrieval failure degrades to empty context; generation still
        // gets a chance to answer (or to fail with its own error).
        let context = match self.retrieval_service.retrieve(&question, self.top_k).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "Context retrieval failed; proceeding without schema context");
                RetrievedContext::empty()
            }
        };

        let context_used = context.concatenated_text();
        let outcome = self.sql_agent.run(&question, &context_used).await;

        match (outcome.sql_query, outcome.result, outcome.error) {
            (Some(sql), Some(result), None) => {
                QueryResponse::success(question, sql, result.to_json(), context_used)
            }
            (sql, _, Some(error)) => {
                QueryResponse::failure(question, sql, context_used, error.to_string())
            }
            // An outcome with neither result nor error cannot leave the
            // agent; treat it as a failure rather than panic.
            (sql, _, None) => QueryResponse::failure(
                question,
                sql,
                context_used,
                "Agent produced no result".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::embedding_provider::{
        EmbeddingProvider, EmbeddingProviderError,
    };
    use crate::application::ports::llm_provider::{ChatMessage, LlmProvider, LlmProviderError};
    use crate::application::ports::sql_executor::{SqlExecutor, SqlExecutorError, SqlResultSet};
    use crate::application::services::sql_agent::DEFAULT_MAX_ATTEMPTS;
    use crate::domain::entities::{
        ColumnDocument, EmbeddingRecord, RelationKind, SchemaDocument, ScoredDocument,
    };
    use crate::domain::repositories::VectorIndex;
    use crate::domain::repositories::vector_index::VectorIndexError;
    use async_trait::async_trait;
    use pgvector::Vector;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vector, EmbeddingProviderError> {
            Ok(Vector::from(vec![1.0, 0.0]))
        }

        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vector>, EmbeddingProviderError> {
            Ok(texts.iter().map(|_| Vector::from(vec![1.0, 0.0])).collect())
        }

        async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
            Ok(true)
        }

        fn model_name(&self) -> String {
            "fixed".to_string()
        }

        fn embedding_dimension(&self) -> usize {
            2
        }
    }

    struct CannedIndex {
        results: Vec<ScoredDocument>,
    }

    #[async_trait]
    impl VectorIndex for CannedIndex {
        async fn rebuild(&self, _records: Vec<EmbeddingRecord>) -> Result<(), VectorIndexError> {
            Ok(())
        }

        async fn query(
            &self,
            _query: &Vector,
            k: usize,
        ) -> Result<Vec<ScoredDocument>, VectorIndexError> {
            Ok(self.results.iter().take(k).cloned().collect())
        }

        async fn is_empty(&self) -> Result<bool, VectorIndexError> {
            Ok(self.results.is_empty())
        }

        async fn count(&self) -> Result<usize, VectorIndexError> {
            Ok(self.results.len())
        }
    }

    struct FixedLlm {
        completion: String,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmProviderError> {
            Ok(self.completion.clone())
        }

        async fn health_check(&self) -> Result<bool, LlmProviderError> {
            Ok(true)
        }

        fn model_name(&self) -> String {
            "fixed".to_string()
        }
    }

    /// Succeeds only for statements that join contracts to invoices.
    struct ContractsExecutor;

    #[async_trait]
    impl SqlExecutor for ContractsExecutor {
        async fn execute(&self, sql: &str) -> Result<SqlResultSet, SqlExecutorError> {
            if sql.contains("LEFT JOIN") && sql.contains("contract_id") {
                Ok(SqlResultSet {
                    columns: vec!["contract_id".to_string(), "status".to_string()],
                    rows: vec![serde_json::json!({"contract_id": "7", "status": "Active"})],
                    rows_affected: None,
                })
            } else {
                Err(SqlExecutorError::StatementError(
                    "relation does not exist".to_string(),
                ))
            }
        }

        async fn health_check(&self) -> Result<(), SqlExecutorError> {
            Ok(())
        }
    }

    fn contracts_document() -> SchemaDocument {
        SchemaDocument::new(
            "sales".to_string(),
            "contracts".to_string(),
            RelationKind::Table,
            None,
            vec![
                ColumnDocument::new("contract_id".to_string(), "integer".to_string(), false, None),
                ColumnDocument::new(
                    "status".to_string(),
                    "character varying".to_string(),
                    true,
                    None,
                ),
            ],
            None,
        )
    }

    fn invoices_document() -> SchemaDocument {
        SchemaDocument::new(
            "public".to_string(),
            "invoices".to_string(),
            RelationKind::Table,
            None,
            vec![
                ColumnDocument::new("invoice_id".to_string(), "integer".to_string(), false, None),
                ColumnDocument::new("contract_id".to_string(), "integer".to_string(), true, None),
            ],
            None,
        )
    }

    fn use_case(
        results: Vec<ScoredDocument>,
        completion: &str,
    ) -> AnswerQuestionUseCase {
        let retrieval = Arc::new(RetrievalService::new(
            Arc::new(FixedEmbedder),
            Arc::new(CannedIndex { results }),
        ));
        let agent = Arc::new(SqlGenerationAgent::new(
            Arc::new(FixedLlm {
                completion: completion.to_string(),
            }),
            Arc::new(ContractsExecutor),
            DEFAULT_MAX_ATTEMPTS,
        ));
        AnswerQuestionUseCase::new(retrieval, agent, 3)
    }

    #[tokio::test]
    async fn test_contracts_without_invoices_scenario() {
        let results = vec![
            ScoredDocument {
                document: contracts_document(),
                score: 0.92,
            },
            ScoredDocument {
                document: invoices_document(),
                score: 0.85,
            },
        ];
        let completion = "```sql\n\
            SELECT c.contract_id, c.status\n\
            FROM sales.contracts c\n\
            LEFT JOIN public.invoices i ON i.contract_id = c.contract_id\n\
            WHERE c.status = 'Active' AND i.invoice_id IS NULL\n\
            ```";

        let response = use_case(results, completion)
            .execute(QueryRequest::new(
                "active contracts that have not been invoiced".to_string(),
            ))
            .await;

        assert!(response.is_terminal());
        assert!(response.error.is_none());
        // Both schema documents ground the generation.
        assert!(response.context_used.contains("Table: contracts (Schema: sales)"));
        assert!(response.context_used.contains("Table: invoices (Schema: public)"));
        let sql = response.sql_query.unwrap();
        assert!(sql.contains("LEFT JOIN"));
        assert!(sql.contains("c.status = 'Active'"));
        assert!(sql.contains("i.invoice_id IS NULL"));
        let result = response.result.unwrap();
        assert_eq!(result["row_count"], 1);
    }

    #[tokio::test]
    async fn test_empty_index_still_yields_a_well_formed_response() {
        let response = use_case(Vec::new(), "I cannot answer without schema information.")
            .execute(QueryRequest::new("anything at all".to_string()))
            .await;

        assert!(response.is_terminal());
        assert_eq!(response.context_used, "");
        assert!(response.sql_query.is_none());
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected_in_the_response() {
        let response = use_case(Vec::new(), "```sql\nSELECT 1\n```")
            .execute(QueryRequest::new("   ".to_string()))
            .await;

        assert!(response.is_terminal());
        assert!(response.error.is_some());
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_exactly_one_of_result_and_error_holds() {
        for completion in ["```sql\nSELECT nothing FROM nowhere\n```", "no sql here"] {
            let response = use_case(
                vec![ScoredDocument {
                    document: contracts_document(),
                    score: 0.5,
                }],
                completion,
            )
            .execute(QueryRequest::new("a question".to_string()))
            .await;

            assert!(response.is_terminal());
        }
    }
}
