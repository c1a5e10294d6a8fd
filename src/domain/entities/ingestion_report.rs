use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one ingestion run. A run that skipped documents because the
/// embedding provider failed for them is still a success, just degraded.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    documents_extracted: usize,
    documents_indexed: usize,
    documents_skipped: usize,
}

impl IngestionReport {
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        documents_extracted: usize,
        documents_indexed: usize,
        documents_skipped: usize,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at,
            documents_extracted,
            documents_indexed,
            documents_skipped,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn documents_extracted(&self) -> usize {
        self.documents_extracted
    }

    pub fn documents_indexed(&self) -> usize {
        self.documents_indexed
    }

    pub fn documents_skipped(&self) -> usize {
        self.documents_skipped
    }

    pub fn is_degraded(&self) -> bool {
        self.documents_skipped > 0
    }
}
