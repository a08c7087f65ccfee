/// Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::backend::MockBackend;
use crate::handlers::*;

pub fn create_router(backend: Arc<MockBackend>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // User endpoints
        .route("/v1/w3s/users", post(create_user))
        .route("/v1/w3s/users/token", post(create_session))
        .route("/v1/w3s/user/initialize", post(initialize_user))

        // Wallet endpoints
        .route("/v1/w3s/wallets", get(list_wallets))
        .route("/v1/w3s/wallets/:id/balances", get(get_balances))

        // Transaction endpoints
        .route("/v1/w3s/user/transactions/transfer", post(create_transfer))
        .route("/v1/w3s/transactions", get(list_transactions))

        // Test helper endpoints
        .route("/mock/challenges/:id/complete", post(complete_challenge))
        .route("/mock/wallets/:id/fund", post(fund_wallet))

        // Shared state
        .with_state(backend)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(backend: Arc<MockBackend>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(backend);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("W3S mock server listening on http://{}", addr);
    log::info!("Challenge completion endpoint: POST /mock/challenges/:id/complete");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve `backend` on an ephemeral localhost port in the background
///
/// Returns the base URL, e.g. `http://127.0.0.1:41234`.
pub async fn spawn_ephemeral(backend: Arc<MockBackend>) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(backend);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            log::error!("Mock server stopped: {}", e);
        }
    });

    Ok(format!("http://{}", addr))
}
