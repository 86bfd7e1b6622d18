//! HTTP API Server for Discovery
//!
//! Provides REST endpoints for the frontend to fetch suggested users and
//! popular profiles. The discovery engine absorbs upstream failures, so
//! these handlers only fail on malformed input (axum rejects non-UUID
//! path segments before the handler runs).

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::discovery::{DiscoveryEngine, SuggestedProfile};
use crate::error::Result;

/// Shared application state
pub struct AppState {
    pub engine: DiscoveryEngine,
}

/// Response for discovery endpoints
#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub items: Vec<SuggestedProfile>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the API router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/suggestions/:viewer_id", get(get_suggestions))
        .route("/api/v1/popular/:viewer_id", get(get_popular))
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(engine: DiscoveryEngine, config: &ApiConfig) -> Result<()> {
    let state = Arc::new(AppState { engine });
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting discovery API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(crate::error::Error::internal)?;
    axum::serve(listener, app)
        .await
        .map_err(crate::error::Error::internal)?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get suggested users for a viewer
async fn get_suggestions(
    State(state): State<Arc<AppState>>,
    Path(viewer_id): Path<Uuid>,
) -> Json<DiscoveryResponse> {
    let items = state.engine.user_suggestions(viewer_id).await;
    let total = items.len();
    Json(DiscoveryResponse { items, total })
}

/// Get popular profiles for a viewer
async fn get_popular(
    State(state): State<Arc<AppState>>,
    Path(viewer_id): Path<Uuid>,
) -> Json<DiscoveryResponse> {
    let items = state.engine.popular_profiles(viewer_id).await;
    let total = items.len();
    Json(DiscoveryResponse { items, total })
}
