use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vellum_api::config;
use vellum_api::database::{self, document_repository::PgDocumentRepository};
use vellum_api::handlers::documents::{self, DocumentServiceState};
use vellum_api::services::document_service::DocumentService;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up POSTGRES_* and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("starting document service v{}", env!("CARGO_PKG_VERSION"));

    let pool = database::connect_pool(&config.postgres)
        .await
        .expect("failed to connect to postgres");
    sqlx::migrate!("migrations/documents")
        .run(&pool)
        .await
        .expect("failed to run document schema migrations");

    let repo = Arc::new(PgDocumentRepository::new(pool.clone()));
    let service = Arc::new(DocumentService::new(repo));
    let app = documents::router(DocumentServiceState { service, pool })
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            vellum_api::middleware::request_id::request_id_middleware,
        ));

    let bind_addr = format!("0.0.0.0:{}", config.services.document_service_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));
    tracing::info!("document service listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
