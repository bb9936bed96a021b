use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::chat::ChatRequest;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.chat.handle(payload).await?;
    Ok(Json(response))
}
