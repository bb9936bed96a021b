use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub name: Option<String>,
}

/// Accepts a raw document body, extracts its text, and installs it as the
/// active corpus.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest(
            "Uploaded document is empty".to_string(),
        ));
    }

    let name = params.name.unwrap_or_else(|| "document".to_string());
    tracing::info!(
        "Received upload '{}' ({} bytes), extracting with '{}'",
        name,
        body.len(),
        state.extractor.name()
    );
    let text = state.extractor.extract(&name, &body).await?;
    let summary = state.ingest.ingest(&name, &text).await?;

    Ok(Json(json!({
        "message": summary.message,
        "chunk_count": summary.chunk_count,
    })))
}
