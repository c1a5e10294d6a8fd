use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::IngestionReport;

#[derive(Debug, Serialize)]
pub struct IngestionReportDto {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents_extracted: usize,
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub degraded: bool,
}

impl From<IngestionReport> for IngestionReportDto {
    fn from(report: IngestionReport) -> Self {
        Self {
            run_id: report.run_id(),
            started_at: report.started_at(),
            finished_at: report.finished_at(),
            documents_extracted: report.documents_extracted(),
            documents_indexed: report.documents_indexed(),
            documents_skipped: report.documents_skipped(),
            degraded: report.is_degraded(),
        }
    }
}
