use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::use_cases::AnswerQuestionUseCase;
use crate::domain::entities::QueryRequest;
use crate::presentation::http::dto::{QueryRequestDto, QueryResponseDto};

pub struct QueryHandler {
    answer_use_case: Arc<AnswerQuestionUseCase>,
}

impl QueryHandler {
    pub fn new(answer_use_case: Arc<AnswerQuestionUseCase>) -> Self {
        Self { answer_use_case }
    }

    pub async fn handle_query(
        State(handler): State<Arc<QueryHandler>>,
        Json(request): Json<QueryRequestDto>,
    ) -> impl IntoResponse {
        let empty = request.natural_language_query.trim().is_empty();

        let response = handler
            .answer_use_case
            .execute(QueryRequest::new(request.natural_language_query))
            .await;

        let status = if empty {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        };

        (status, Json(QueryResponseDto::from(response)))
    }
}
