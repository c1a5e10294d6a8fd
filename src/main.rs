mod application;
mod domain;
mod infrastructure;
mod presentation;

use infrastructure::config::AppConfig;
use infrastructure::container::AppContainer;
use presentation::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(database_url = %config.masked_database_url(), "Starting schemarag");

    let container = AppContainer::new(config).await?;

    // One-time startup ingestion. A failed run keeps whatever index
    // already exists; health reports the degradation until a refresh
    // succeeds.
    match container.ingestion_service.ingest().await {
        Ok(report) => tracing::info!(
            extracted = report.documents_extracted(),
            indexed = report.documents_indexed(),
            skipped = report.documents_skipped(),
            "Startup ingestion complete"
        ),
        Err(e) => {
            tracing::error!(error = %e, "Startup ingestion failed; serving with existing index")
        }
    }

    let server = HttpServer::new(
        container.query_handler.clone(),
        container.ingest_handler.clone(),
        container.health_handler.clone(),
        Some(container.config.port),
    );

    server.run().await
}
