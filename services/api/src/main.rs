use std::sync::Arc;

use tracing::info;

use cinelink_api::config::ApiConfig;
use cinelink_api::router::build_router;
use cinelink_api::state::AppState;
use cinelink_api::telemetry;

#[tokio::main]
async fn main() {
    telemetry::init_tracing();

    let config = Arc::new(ApiConfig::from_env());
    let state = AppState::init(config.clone())
        .await
        .expect("failed to initialize application state");

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("cinelink api listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
