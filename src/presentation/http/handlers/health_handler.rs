use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::HealthService;
use crate::presentation::http::dto::HealthResponseDto;

pub struct HealthHandler {
    health_service: Arc<HealthService>,
}

impl HealthHandler {
    pub fn new(health_service: Arc<HealthService>) -> Self {
        Self { health_service }
    }

    /// Probes every dependency on each call; nothing is cached between
    /// requests.
    pub async fn health(State(handler): State<Arc<HealthHandler>>) -> impl IntoResponse {
        let health = handler.health_service.check().await;

        let dto = HealthResponseDto {
            status: health.status.as_str().to_string(),
            services: health.services,
        };

        (StatusCode::OK, Json(dto))
    }
}
