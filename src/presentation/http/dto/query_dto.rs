use serde::{Deserialize, Serialize};

use crate::domain::entities::QueryResponse;

#[derive(Debug, Deserialize)]
pub struct QueryRequestDto {
    pub natural_language_query: String,
}

/// The literal response contract of `POST /query`: exactly these five
/// fields, all nullable except the echoed question.
#[derive(Debug, Serialize)]
pub struct QueryResponseDto {
    pub natural_language_query: String,
    pub sql_query: Option<String>,
    pub result: Option<serde_json::Value>,
    pub context_used: String,
    pub error: Option<String>,
}

impl From<QueryResponse> for QueryResponseDto {
    fn from(response: QueryResponse) -> Self {
        Self {
            natural_language_query: response.natural_language_query,
            sql_query: response.sql_query,
            result: response.result,
            context_used: response.context_used,
            error: response.error,
        }
    }
}
