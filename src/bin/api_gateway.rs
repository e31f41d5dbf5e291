use tracing_subscriber::EnvFilter;

use vellum_api::client::{DocumentServiceClient, UserServiceClient};
use vellum_api::config;
use vellum_api::handlers::gateway::{self, GatewayState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::config();
    tracing::info!("starting api gateway v{}", env!("CARGO_PKG_VERSION"));

    let state = GatewayState {
        user_client: UserServiceClient::new(config.services.user_service_address.clone()),
        document_client: DocumentServiceClient::new(
            config.services.document_service_address.clone(),
        ),
    };
    let app = gateway::router(state);

    let bind_addr = format!("0.0.0.0:{}", config.services.api_gateway_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));
    tracing::info!("api gateway listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
