//! Proxy selection and outcome reporting handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::server::AppState;
use crate::error::PoolError;
use crate::proxy::FailureOutcome;

/// Request body naming one proxy identity
#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    pub identity: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessReport {
    pub identity: String,
    pub successes: u64,
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub identity: String,
    pub failures: Option<u64>,
    pub evicted: bool,
}

impl FailureReport {
    fn new(identity: String, outcome: FailureOutcome) -> Self {
        Self {
            identity,
            failures: outcome.failures(),
            evicted: outcome.evicted(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddProxyResponse {
    pub identity: String,
    pub created: bool,
}

/// Select a proxy with the current strategy
pub async fn get_proxy(State(state): State<AppState>) -> Result<impl IntoResponse, PoolError> {
    match state.manager.get_proxy().await? {
        Some(endpoints) => Ok(Json(endpoints)),
        None => Err(PoolError::NoProxiesAvailable),
    }
}

pub async fn report_success(
    State(state): State<AppState>,
    payload: Result<Json<IdentityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PoolError> {
    let Json(req) = payload?;
    let successes = state.manager.report_success(&req.identity).await?;
    Ok(Json(SuccessReport {
        identity: req.identity,
        successes,
    }))
}

pub async fn report_failure(
    State(state): State<AppState>,
    payload: Result<Json<IdentityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PoolError> {
    let Json(req) = payload?;
    let outcome = state.manager.report_failure(&req.identity).await?;
    Ok(Json(FailureReport::new(req.identity, outcome)))
}

/// Register a proxy by hand
pub async fn add_proxy(
    State(state): State<AppState>,
    payload: Result<Json<IdentityRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PoolError> {
    let Json(req) = payload?;
    let identity = req.identity.trim().to_string();
    let created = state.manager.add_proxy(&identity).await?;

    if created {
        info!(identity = %identity, "Proxy added via API");
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AddProxyResponse { identity, created })))
}
