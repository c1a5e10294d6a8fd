pub mod health_routes;
pub mod ingest_routes;
pub mod query_routes;

pub use health_routes::*;
pub use ingest_routes::*;
pub use query_routes::*;
