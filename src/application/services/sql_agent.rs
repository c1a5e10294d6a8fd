use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::application::ports::llm_provider::ChatMessage;
use crate::application::ports::sql_executor::SqlResultSet;
use crate::application::ports::{LlmProvider, SqlExecutor};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const SYSTEM_PROMPT: &str = "You are an expert PostgreSQL assistant. Given schema context and a \
user question, respond with exactly one SQL statement that answers the question, inside a \
```sql fenced block. Do not invent tables or columns that are not in the context.";

const NO_CONTEXT_NOTICE: &str = "No schema context available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Planning,
    GeneratingSql,
    Executing,
    Retrying,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub enum AgentError {
    /// The model produced no usable SQL statement. Terminal; retries are
    /// reserved for execution failures.
    GenerationError(String),
    /// The generated statement was rejected by the database after the
    /// attempt bound was exhausted.
    ExecutionError(String),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::GenerationError(msg) => write!(f, "Generation error: {}", msg),
            AgentError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for AgentError {}

/// Terminal outcome of one agent run. `sql_query` holds the last
/// attempted statement even on failure, when one exists.
#[derive(Debug)]
pub struct AgentOutcome {
    pub sql_query: Option<String>,
    pub result: Option<SqlResultSet>,
    pub error: Option<AgentError>,
    pub attempts: u32,
    pub final_state: AgentState,
}

impl AgentOutcome {
    fn success(sql: String, result: SqlResultSet, attempts: u32) -> Self {
        Self {
            sql_query: Some(sql),
            result: Some(result),
            error: None,
            attempts,
            final_state: AgentState::Succeeded,
        }
    }

    fn failure(sql: Option<String>, error: AgentError, attempts: u32) -> Self {
        Self {
            sql_query: sql,
            result: None,
            error: Some(error),
            attempts,
            final_state: AgentState::Failed,
        }
    }
}

/// Drives the bounded generate-execute-retry loop:
/// Planning -> GeneratingSql -> Executing -> {Succeeded | Retrying -> GeneratingSql | Failed}.
/// On execution failure the database error is fed back into the next
/// generation step; the attempt bound caps the loop.
pub struct SqlGenerationAgent {
    llm_provider: Arc<dyn LlmProvider>,
    sql_executor: Arc<dyn SqlExecutor>,
    max_attempts: u32,
}

impl SqlGenerationAgent {
    pub fn new(
        llm_provider: Arc<dyn LlmProvider>,
        sql_executor: Arc<dyn SqlExecutor>,
        max_attempts: u32,
    ) -> Self {
        Self {
            llm_provider,
            sql_executor,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn run(&self, question: &str, context_text: &str) -> AgentOutcome {
        let mut state = AgentState::Planning;
        tracing::debug!(?state, "Assembling prompt from question and retrieved context");
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(question, context_text)),
        ];

        let mut last_sql: Option<String> = None;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            state = AgentState::GeneratingSql;
            tracing::debug!(attempt, ?state, "Requesting SQL candidate");

            let completion = match self.llm_provider.complete(&messages).await {
                Ok(text) => text,
                Err(e) => {
                    return AgentOutcome::failure(
                        last_sql,
                        AgentError::GenerationError(e.to_string()),
                        attempt,
                    );
                }
            };

            let sql = match extract_sql(&completion) {
                Some(sql) => sql,
                None => {
                    return AgentOutcome::failure(
                        last_sql,
                        AgentError::GenerationError(
                            "Model output contained no SQL statement".to_string(),
                        ),
                        attempt,
                    );
                }
            };

            state = AgentState::Executing;
            tracing::debug!(attempt, ?state, sql = %sql, "Executing candidate statement");

            match self.sql_executor.execute(&sql).await {
                Ok(result) => {
                    tracing::info!(attempt, rows = result.row_count(), "SQL execution succeeded");
                    return AgentOutcome::success(sql, result, attempt);
                }
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(attempt, error = %last_error, "SQL execution failed");
                    last_sql = Some(sql.clone());

                    if attempt < self.max_attempts {
                        state = AgentState::Retrying;
                        tracing::debug!(attempt, ?state, "Feeding error back for self-correction");
                        messages.push(ChatMessage::assistant(completion));
                        messages.push(ChatMessage::user(build_retry_prompt(&sql, &last_error)));
                    }
                }
            }
        }

        AgentOutcome::failure(
            last_sql,
            AgentError::ExecutionError(last_error),
            self.max_attempts,
        )
    }
}

fn build_user_prompt(question: &str, context_text: &str) -> String {
    let context = if context_text.trim().is_empty() {
        NO_CONTEXT_NOTICE
    } else {
        context_text
    };

    format!(
        "Based on the following potentially relevant schema information:\n\
         --- SCHEMA CONTEXT START ---\n{}\n--- SCHEMA CONTEXT END ---\n\n\
         User query: {}\n\n\
         Generate a SQL query to answer the user query.",
        context, question
    )
}

fn build_retry_prompt(sql: &str, error: &str) -> String {
    format!(
        "The previous statement failed.\n\
         Statement:\n{}\n\
         Database error:\n{}\n\n\
         Correct the statement and respond with a single fixed SQL statement.",
        sql, error
    )
}

/// Locates the SQL-shaped content in a model completion: a ```sql fence,
/// then any fence whose body starts with a statement keyword, then the
/// first statement-keyword line of the raw text.
pub fn extract_sql(completion: &str) -> Option<String> {
    static SQL_FENCE: OnceLock<Regex> = OnceLock::new();
    static ANY_FENCE: OnceLock<Regex> = OnceLock::new();
    static STATEMENT: OnceLock<Regex> = OnceLock::new();

    let sql_fence = SQL_FENCE
        .get_or_init(|| Regex::new(r"(?is)```sql\s*(.+?)```").expect("hard-coded regex is valid"));
    // An optional language tag (```postgresql, ...) is not part of the statement.
    let any_fence = ANY_FENCE.get_or_init(|| {
        Regex::new(r"(?is)```(?:[a-z]+[ \t]*\n)?\s*(.+?)```").expect("hard-coded regex is valid")
    });
    // A statement runs until a semicolon, a blank line, or end of text.
    let statement = STATEMENT.get_or_init(|| {
        Regex::new(r"(?im)^\s*((?:SELECT|WITH|INSERT|UPDATE|DELETE|EXPLAIN)\b[\s\S]*?)(?:;|\n[ \t]*\n|\z)")
            .expect("hard-coded regex is valid")
    });

    if let Some(captures) = sql_fence.captures(completion) {
        return normalize_statement(captures.get(1)?.as_str());
    }

    if let Some(captures) = any_fence.captures(completion) {
        let body = captures.get(1)?.as_str();
        if statement.is_match(body) {
            return normalize_statement(body);
        }
    }

    statement
        .captures(completion)
        .and_then(|captures| normalize_statement(captures.get(1)?.as_str()))
}

fn normalize_statement(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(';').trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
