use serde::{Deserialize, Serialize};

/// One natural-language question. Lives for the duration of a single
/// request; no query-time state persists.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub natural_language_query: String,
}

impl QueryRequest {
    pub fn new(natural_language_query: String) -> Self {
        Self {
            natural_language_query,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.natural_language_query.trim().is_empty()
    }
}

/// The externally visible answer. Exactly one of (`result`, `error`) is
/// populated on completion; `sql_query` is absent only when generation
/// never produced a statement.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub natural_language_query: String,
    pub sql_query: Option<String>,
    pub result: Option<serde_json::Value>,
    pub context_used: String,
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn success(
        natural_language_query: String,
        sql_query: String,
        result: serde_json::Value,
        context_used: String,
    ) -> Self {
        Self {
            natural_language_query,
            sql_query: Some(sql_query),
            result: Some(result),
            context_used,
            error: None,
        }
    }

    pub fn failure(
        natural_language_query: String,
        sql_query: Option<String>,
        context_used: String,
        error: String,
    ) -> Self {
        Self {
            natural_language_query,
            sql_query,
            result: None,
            context_used,
            error: Some(error),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some() != self.error.is_some()
    }
}
