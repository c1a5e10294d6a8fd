use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug)]
pub enum SqlExecutorError {
    ConnectionError(String),
    /// The statement itself was rejected by the database (syntax error,
    /// unknown relation, permission). Feeds the agent's retry loop.
    StatementError(String),
}

impl std::fmt::Display for SqlExecutorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlExecutorError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            SqlExecutorError::StatementError(msg) => write!(f, "Statement error: {}", msg),
        }
    }
}

impl std::error::Error for SqlExecutorError {}

/// Result of executing one generated statement. Values are textual (the
/// simple-query wire form); row order is whatever the statement yielded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SqlResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Value>,
    pub rows_affected: Option<u64>,
}

impl SqlResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "columns": self.columns,
            "rows": self.rows,
            "row_count": self.row_count(),
            "rows_affected": self.rows_affected,
        })
    }
}

/// Executes agent-generated SQL against the target database. Each call
/// owns an independent session; callers never share statement state.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<SqlResultSet, SqlExecutorError>;

    async fn health_check(&self) -> Result<(), SqlExecutorError>;
}
