use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::EmbeddingProvider;
use crate::domain::entities::{EmbeddingRecord, IngestionReport, SchemaDocument};
use crate::domain::repositories::{SchemaRepository, VectorIndex};

#[derive(Debug)]
pub enum IngestionError {
    /// A run is already in flight; ingestion is not re-entrant.
    AlreadyRunning,
    ExtractionError(String),
    IndexError(String),
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionError::AlreadyRunning => write!(f, "An ingestion run is already in progress"),
            IngestionError::ExtractionError(msg) => write!(f, "Extraction error: {}", msg),
            IngestionError::IndexError(msg) => write!(f, "Index error: {}", msg),
        }
    }
}

impl std::error::Error for IngestionError {}

/// Sequences one ingestion run: catalog extraction, embedding, and a
/// wholesale index rebuild. Run once at startup and again on explicit
/// refresh; never on a schedule.
pub struct IngestionService {
    schema_repository: Arc<dyn SchemaRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IngestionService {
    pub fn new(
        schema_repository: Arc<dyn SchemaRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            schema_repository,
            embedding_provider,
            vector_index,
            in_flight: AtomicBool::new(false),
        }
    }

    pub async fn ingest(&self) -> Result<IngestionReport, IngestionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(IngestionError::AlreadyRunning);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, "Starting schema ingestion run");

        // Extraction failure is fatal to the run: no partial index gets
        // built from a broken connection. The prior index stays in place.
        let documents = self
            .schema_repository
            .load_schema_documents()
            .await
            .map_err(|e| IngestionError::ExtractionError(e.to_string()))?;

        let extracted = documents.len();
        if documents.is_empty() {
            tracing::warn!(%run_id, "No schema documents extracted; the vector index will be empty");
        }

        let (records, skipped) = self.embed_documents(documents).await;
        let indexed = records.len();

        self.vector_index
            .rebuild(records)
            .await
            .map_err(|e| IngestionError::IndexError(e.to_string()))?;

        let report = IngestionReport::new(run_id, started_at, Utc::now(), extracted, indexed, skipped);
        tracing::info!(
            %run_id,
            extracted = report.documents_extracted(),
            indexed = report.documents_indexed(),
            skipped = report.documents_skipped(),
            "Schema ingestion run finished"
        );

        Ok(report)
    }

    /// Embeds every document's rendered text. A provider failure for one
    /// document skips that document; the run continues and the resulting
    /// index is a best-effort subset.
    async fn embed_documents(
        &self,
        documents: Vec<SchemaDocument>,
    ) -> (Vec<EmbeddingRecord>, usize) {
        if documents.is_empty() {
            return (Vec::new(), 0);
        }

        let texts: Vec<String> = documents.iter().map(|d| d.rendered_text()).collect();

        match self.embedding_provider.embed_many(&texts).await {
            Ok(vectors) if vectors.len() == documents.len() => {
                let records = documents
                    .into_iter()
                    .zip(vectors)
                    .map(|(document, vector)| EmbeddingRecord::new(document, vector))
                    .collect();
                (records, 0)
            }
            Ok(vectors) => {
                tracing::warn!(
                    expected = documents.len(),
                    actual = vectors.len(),
                    "Batch embedding returned a mismatched count; retrying per document"
                );
                self.embed_one_by_one(documents).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Batch embedding failed; retrying per document");
                self.embed_one_by_one(documents).await
            }
        }
    }

    async fn embed_one_by_one(
        &self,
        documents: Vec<SchemaDocument>,
    ) -> (Vec<EmbeddingRecord>, usize) {
        let mut records = Vec::with_capacity(documents.len());
        let mut skipped = 0;

        for document in documents {
            let id = document.qualified_name();
            match self.embedding_provider.embed(&document.rendered_text()).await {
                Ok(vector) => records.push(EmbeddingRecord::new(document, vector)),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(document = %id, error = %e, "Skipping document: embedding failed");
                }
            }
        }

        (records, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::embedding_provider::EmbeddingProviderError;
    use crate::domain::entities::{RelationKind, ScoredDocument};
    use crate::domain::repositories::schema_repository::SchemaRepositoryError;
    use crate::domain::repositories::vector_index::VectorIndexError;
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::sync::Mutex;

    struct FakeSchemaRepository {
        documents: Result<Vec<SchemaDocument>, String>,
    }

    #[async_trait]
    impl SchemaRepository for FakeSchemaRepository {
        async fn load_schema_documents(
            &self,
        ) -> Result<Vec<SchemaDocument>, SchemaRepositoryError> {
            match &self.documents {
                Ok(docs) => Ok(docs.clone()),
                Err(msg) => Err(SchemaRepositoryError::ConnectionError(msg.clone())),
            }
        }

        async fn health_check(&self) -> Result<(), SchemaRepositoryError> {
            Ok(())
        }
    }

    /// Fails the batch call and every per-document call whose text
    /// contains one of the poisoned names.
    struct FlakyEmbedder {
        poisoned: Vec<String>,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        async fn embed(&self, text: &str) -> Result<Vector, EmbeddingProviderError> {
            if self.poisoned.iter().any(|name| text.contains(name.as_str())) {
                return Err(EmbeddingProviderError::ServiceUnavailable);
            }
            Ok(Vector::from(vec![1.0, 0.0, 0.0]))
        }

        async fn embed_many(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vector>, EmbeddingProviderError> {
            if self.poisoned.is_empty() {
                return Ok(texts.iter().map(|_| Vector::from(vec![1.0, 0.0, 0.0])).collect());
            }
            Err(EmbeddingProviderError::ServiceUnavailable)
        }

        async fn health_check(&self) -> Result<bool, EmbeddingProviderError> {
            Ok(true)
        }

        fn model_name(&self) -> String {
            "flaky".to_string()
        }

        fn embedding_dimension(&self) -> usize {
            3
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        rebuilt_with: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn rebuild(&self, records: Vec<EmbeddingRecord>) -> Result<(), VectorIndexError> {
            *self.rebuilt_with.lock().unwrap() = Some(records.len());
            Ok(())
        }

        async fn query(
            &self,
            _query: &Vector,
            _k: usize,
        ) -> Result<Vec<ScoredDocument>, VectorIndexError> {
            Ok(Vec::new())
        }

        async fn is_empty(&self) -> Result<bool, VectorIndexError> {
            Ok(self.rebuilt_with.lock().unwrap().unwrap_or(0) == 0)
        }

        async fn count(&self) -> Result<usize, VectorIndexError> {
            Ok(self.rebuilt_with.lock().unwrap().unwrap_or(0))
        }
    }

    fn document(name: &str) -> SchemaDocument {
        SchemaDocument::new(
            "public".to_string(),
            name.to_string(),
            RelationKind::Table,
            None,
            Vec::new(),
            None,
        )
    }

    fn service(
        documents: Result<Vec<SchemaDocument>, String>,
        poisoned: Vec<String>,
    ) -> (IngestionService, Arc<RecordingIndex>) {
        let index = Arc::new(RecordingIndex::default());
        let service = IngestionService::new(
            Arc::new(FakeSchemaRepository { documents }),
            Arc::new(FlakyEmbedder { poisoned }),
            index.clone(),
        );
        (service, index)
    }

    #[tokio::test]
    async fn test_empty_catalog_is_a_successful_run() {
        let (service, index) = service(Ok(Vec::new()), Vec::new());

        let report = service.ingest().await.unwrap();
        assert_eq!(report.documents_extracted(), 0);
        assert_eq!(report.documents_indexed(), 0);
        assert_eq!(report.documents_skipped(), 0);
        assert_eq!(*index.rebuilt_with.lock().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_unreachable_database_fails_the_run() {
        let (service, index) = service(Err("connection refused".to_string()), Vec::new());

        let error = service.ingest().await.unwrap_err();
        assert!(matches!(error, IngestionError::ExtractionError(_)));
        // The index was never touched; any prior contents stay in place.
        assert!(index.rebuilt_with.lock().unwrap().is_none());
        // The in-flight flag was released on the failure path.
        assert!(!service.in_flight.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_one_failing_document_out_of_five_is_skipped() {
        let documents: Vec<SchemaDocument> =
            ["alpha", "beta", "gamma", "delta", "epsilon"]
                .iter()
                .map(|name| document(name))
                .collect();
        let (service, index) = service(Ok(documents), vec!["gamma".to_string()]);

        let report = service.ingest().await.unwrap();
        assert_eq!(report.documents_extracted(), 5);
        assert_eq!(report.documents_indexed(), 4);
        assert_eq!(report.documents_skipped(), 1);
        assert!(report.is_degraded());
        assert_eq!(*index.rebuilt_with.lock().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_all_documents_indexed_via_batch_path() {
        let documents = vec![document("alpha"), document("beta")];
        let (service, index) = service(Ok(documents), Vec::new());

        let report = service.ingest().await.unwrap();
        assert_eq!(report.documents_indexed(), 2);
        assert!(!report.is_degraded());
        assert_eq!(*index.rebuilt_with.lock().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_second_concurrent_run_is_rejected() {
        let (service, _index) = service(Ok(vec![document("alpha")]), Vec::new());
        let service = Arc::new(service);

        // Hold the flag the way a running ingestion would.
        assert!(service
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok());

        let error = service.ingest().await.unwrap_err();
        assert!(matches!(error, IngestionError::AlreadyRunning));

        service.in_flight.store(false, Ordering::SeqCst);
        assert!(service.ingest().await.is_ok());
    }
}
