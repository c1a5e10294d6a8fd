use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    Postgres,
    Memory,
}

/// Process configuration, read once at startup. Every value has a
/// default so a bare environment still boots against local services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub include_schemas: Vec<String>,
    pub vector_backend: VectorBackend,
    pub top_k: usize,
    pub max_sql_attempts: u32,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            build_database_url(
                &env::var("POSTGRES_USER").unwrap_or_else(|_| "user".to_string()),
                &env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| "password".to_string()),
                &env::var("DB_HOST").unwrap_or_else(|_| "db".to_string()),
                &env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                &env::var("POSTGRES_DB").unwrap_or_else(|_| "ragdb".to_string()),
            )
        });

        let include_schemas = env::var("SCHEMA_INCLUDE")
            .map(|raw| parse_schema_list(&raw))
            .unwrap_or_default();

        let vector_backend = match env::var("VECTOR_BACKEND").as_deref() {
            Ok("memory") => VectorBackend::Memory,
            _ => VectorBackend::Postgres,
        };

        let top_k = env::var("RETRIEVAL_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let max_sql_attempts = env::var("SQL_AGENT_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let port = env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000);

        Self {
            database_url,
            include_schemas,
            vector_backend,
            top_k,
            max_sql_attempts,
            port,
        }
    }

    /// Connection URL with the password replaced, for logging.
    pub fn masked_database_url(&self) -> String {
        mask_password(&self.database_url)
    }
}

pub fn build_database_url(user: &str, password: &str, host: &str, port: &str, name: &str) -> String {
    format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
}

fn parse_schema_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn mask_password(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };
    match rest[..at].find(':') {
        Some(colon) => format!(
            "{}://{}:********@{}",
            &url[..scheme_end],
            &rest[..colon],
            &rest[at + 1..]
        ),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            build_database_url("user", "password", "db", "5432", "ragdb"),
            "postgres://user:password@db:5432/ragdb"
        );
    }

    #[test]
    fn test_parse_schema_list() {
        assert_eq!(
            parse_schema_list("sales, public ,"),
            vec!["sales".to_string(), "public".to_string()]
        );
        assert!(parse_schema_list("").is_empty());
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://user:s3cret@db:5432/ragdb"),
            "postgres://user:********@db:5432/ragdb"
        );
        assert_eq!(mask_password("not a url"), "not a url");
    }
}
