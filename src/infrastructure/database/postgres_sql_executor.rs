use async_trait::async_trait;
use tokio_postgres::{NoTls, SimpleQueryMessage, SimpleQueryRow};

use crate::application::ports::SqlExecutor;
use crate::application::ports::sql_executor::{SqlExecutorError, SqlResultSet};

/// Runs agent-generated SQL against the target database. Uses the
/// simple-query protocol so result values arrive as text regardless of
/// column types, and opens a fresh session per call: concurrent requests
/// never share statement state.
pub struct PostgresSqlExecutor {
    connection_string: String,
}

impl PostgresSqlExecutor {
    pub fn new(connection_string: String) -> Self {
        Self { connection_string }
    }

    async fn run(&self, sql: &str) -> Result<Vec<SimpleQueryMessage>, SqlExecutorError> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls)
            .await
            .map_err(|e| SqlExecutorError::ConnectionError(e.to_string()))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "Database connection task ended with an error");
            }
        });

        let result = client
            .simple_query(sql)
            .await
            .map_err(|e| SqlExecutorError::StatementError(e.to_string()));

        drop(client);
        driver.abort();

        result
    }
}

#[async_trait]
impl SqlExecutor for PostgresSqlExecutor {
    async fn execute(&self, sql: &str) -> Result<SqlResultSet, SqlExecutorError> {
        let messages = self.run(sql).await?;
        Ok(collect_result_set(messages))
    }

    async fn health_check(&self) -> Result<(), SqlExecutorError> {
        self.run("SELECT 1").await.map(|_| ())
    }
}

fn collect_result_set(messages: Vec<SimpleQueryMessage>) -> SqlResultSet {
    let mut result = SqlResultSet::default();

    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                if result.columns.is_empty() {
                    result.columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                }
                result.rows.push(row_to_json(&row));
            }
            SimpleQueryMessage::CommandComplete(affected) => {
                result.rows_affected = Some(affected);
            }
            _ => {}
        }
    }

    result
}

fn row_to_json(row: &SimpleQueryRow) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = match row.get(i) {
            Some(text) => serde_json::Value::String(text.to_string()),
            None => serde_json::Value::Null,
        };
        object.insert(column.name().to_string(), value);
    }
    serde_json::Value::Object(object)
}
