//! Health check endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::server::AppState;
use crate::error::PoolError;

/// Liveness check
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "proxypool"
        })),
    )
}

/// Uptime and pool size
pub async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let proxies = state.manager.catalog().size().await?;

    Ok(Json(json!({
        "status": "running",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "proxies": proxies,
        "strategy": state.manager.strategy(),
    })))
}
