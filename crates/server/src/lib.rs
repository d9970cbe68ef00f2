//! HTTP query service.
//!
//! Exposes a liveness route and an authenticated similarity search over the
//! index written by the builder.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{QueryRequest, SearchResponse, SearchResult};
pub use state::{RetrieverHealth, ServiceState};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use simsearch_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path of the search endpoint.
pub const SEARCH_PATH: &str = "/api/similarity-search";

/// Build the router for all endpoints.
pub fn build_router(state: Arc<ServiceState>) -> Router {
    let protected = Router::new()
        .route(SEARCH_PATH, post(routes::similarity_search))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/", get(routes::root))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize the service from `config` and serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> AppResult<()> {
    let state = Arc::new(ServiceState::initialize(config).await?);

    if !state.is_ready() {
        tracing::warn!("Starting without a retriever; searches will return 503");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Similarity search API listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
