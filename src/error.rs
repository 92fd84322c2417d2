use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the proxy pool
#[derive(Error, Debug)]
pub enum PoolError {
    // Store errors
    #[error("Proxy store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Proxy store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Counter {field} of {key} is not an integer: {value:?}")]
    InvalidCounter {
        key: String,
        field: String,
        value: String,
    },

    // Proxy errors
    #[error("Invalid proxy format: {0}")]
    InvalidProxyFormat(String),

    #[error("Unknown proxy: {identity}")]
    UnknownProxy { identity: String },

    #[error("No proxies available")]
    NoProxiesAvailable,

    // Provisioning errors
    #[error("Provisioning failed: {0}")]
    ProvisioningFailure(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for proxy pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            PoolError::InvalidRequest(_)
            | PoolError::InvalidProxyFormat(_)
            | PoolError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            PoolError::UnknownProxy { .. } => StatusCode::NOT_FOUND,

            // 502 Bad Gateway
            PoolError::ProvisioningFailure(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            PoolError::NoProxiesAvailable | PoolError::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            PoolError::Store(_)
            | PoolError::Database(_)
            | PoolError::InvalidCounter { .. }
            | PoolError::Io(_)
            | PoolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for PoolError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

// Provider HTTP failures all surface as provisioning failures
impl From<reqwest::Error> for PoolError {
    fn from(err: reqwest::Error) -> Self {
        PoolError::ProvisioningFailure(err.to_string())
    }
}

// Malformed request bodies get the same JSON error shape as every other failure
impl From<axum::extract::rejection::JsonRejection> for PoolError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        PoolError::InvalidRequest(rejection.body_text())
    }
}

impl From<url::ParseError> for PoolError {
    fn from(err: url::ParseError) -> Self {
        PoolError::InvalidConfig(err.to_string())
    }
}
