use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "corpus": state.index.corpus_info().await,
        "index_queries": state.index.query_count(),
        "webhook_configured": state.webhook.is_configured(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
