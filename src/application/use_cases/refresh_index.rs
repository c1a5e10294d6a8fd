use std::sync::Arc;

use crate::application::services::IngestionService;
use crate::application::services::ingestion_service::IngestionError;
use crate::domain::entities::IngestionReport;

/// Explicit re-ingestion entry point. Refreshing replaces the whole
/// vector index; there is no incremental diffing.
pub struct RefreshIndexUseCase {
    ingestion_service: Arc<IngestionService>,
}

impl RefreshIndexUseCase {
    pub fn new(ingestion_service: Arc<IngestionService>) -> Self {
        Self { ingestion_service }
    }

    pub async fn execute(&self) -> Result<IngestionReport, IngestionError> {
        self.ingestion_service.ingest().await
    }
}
