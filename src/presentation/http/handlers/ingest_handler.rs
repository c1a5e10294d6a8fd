use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::ingestion_service::IngestionError;
use crate::application::use_cases::RefreshIndexUseCase;
use crate::presentation::http::dto::{ApiResponse, IngestionReportDto};

pub struct IngestHandler {
    refresh_use_case: Arc<RefreshIndexUseCase>,
}

impl IngestHandler {
    pub fn new(refresh_use_case: Arc<RefreshIndexUseCase>) -> Self {
        Self { refresh_use_case }
    }

    pub async fn refresh_index(
        State(handler): State<Arc<IngestHandler>>,
    ) -> impl IntoResponse {
        match handler.refresh_use_case.execute().await {
            Ok(report) => {
                let dto = IngestionReportDto::from(report);
                (StatusCode::OK, Json(ApiResponse::success(dto)))
            }
            Err(IngestionError::AlreadyRunning) => (
                StatusCode::CONFLICT,
                Json(ApiResponse::error(
                    "INGESTION_IN_PROGRESS".to_string(),
                    IngestionError::AlreadyRunning.to_string(),
                    None,
                )),
            ),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "INGESTION_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            ),
        }
    }
}
