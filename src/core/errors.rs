use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("generation timed out after {0} seconds")]
    GenerationTimeout(u64),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("index corrupted: {0}")]
    IndexCorrupted(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            ApiError::Retrieval(msg) => (StatusCode::BAD_GATEWAY, "retrieval", msg.clone()),
            ApiError::GenerationTimeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                format!("Response generation timed out after {} seconds", secs),
            ),
            ApiError::Generation(msg) => (StatusCode::BAD_GATEWAY, "generation", msg.clone()),
            ApiError::IndexCorrupted(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "index", msg.clone())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone()),
        };

        let body = Json(json!({ "error": message, "kind": kind }));
        (status, body).into_response()
    }
}
