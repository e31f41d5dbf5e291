use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vellum_api::config;
use vellum_api::database::{self, user_repository::PgUserRepository};
use vellum_api::handlers::users::{self, UserServiceState};
use vellum_api::services::user_service::UserService;

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
    tracing::info!("starting user service v{}", env!("CARGO_PKG_VERSION"));

    let pool = database::connect_pool(&config.postgres)
        .await
        .expect("failed to connect to postgres");
    sqlx::migrate!("migrations/users")
        .run(&pool)
        .await
        .expect("failed to run user schema migrations");

    let repo = Arc::new(PgUserRepository::new(
        pool.clone(),
        config.security.bcrypt_cost,
    ));
    let service = Arc::new(UserService::new(repo));
    let app = users::router(UserServiceState { service, pool })
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            vellum_api::middleware::request_id::request_id_middleware,
        ));

    let bind_addr = format!("0.0.0.0:{}", config.services.user_service_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));
    tracing::info!("user service listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
