//! Pool-wide handlers: provisioning, stats and strategy

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::server::AppState;
use crate::error::PoolError;
use crate::proxy::SelectionStrategy;

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub loaded: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StrategyBody {
    pub strategy: SelectionStrategy,
}

/// Provision proxies if the pool is empty
pub async fn initialize(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let loaded = state.manager.initialize().await?;
    Ok(Json(LoadResponse { loaded }))
}

/// Replace the whole pool with a fresh provider batch
pub async fn refresh(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    let loaded = state.manager.refresh().await?;
    Ok(Json(LoadResponse { loaded }))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    Ok(Json(state.manager.stats().await?))
}

pub async fn get_strategy(State(state): State<AppState>) -> impl IntoResponse {
    Json(StrategyBody {
        strategy: state.manager.strategy(),
    })
}

pub async fn set_strategy(
    State(state): State<AppState>,
    payload: Result<Json<StrategyBody>, JsonRejection>,
) -> Result<impl IntoResponse, PoolError> {
    let Json(body) = payload?;
    state.manager.set_strategy(body.strategy);
    Ok(Json(body))
}
