//! API route definitions

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/status", get(handlers::health::status))
        .nest("/api", pool_routes())
        .with_state(state)
}

fn pool_routes() -> Router<AppState> {
    Router::new()
        // Selection and reporting
        .route("/proxy", get(handlers::proxy::get_proxy))
        .route("/report/success", post(handlers::proxy::report_success))
        .route("/report/failure", post(handlers::proxy::report_failure))
        .route("/proxies", post(handlers::proxy::add_proxy))
        // Pool management
        .route("/initialize", post(handlers::pool::initialize))
        .route("/refresh", post(handlers::pool::refresh))
        .route("/stats", get(handlers::pool::get_stats))
        .route(
            "/strategy",
            get(handlers::pool::get_strategy).put(handlers::pool::set_strategy),
        )
}
