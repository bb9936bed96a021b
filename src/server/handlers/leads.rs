use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;
use crate::webhook::{dispatch_chat_log, dispatch_lead, Lead};

#[derive(Debug, Deserialize)]
pub struct ChatLogRequest {
    pub session_id: String,
    #[serde(default)]
    pub chat_history: Vec<Value>,
    #[serde(default)]
    pub user_info: Option<Value>,
}

/// Validates the lead and queues it for CRM delivery. The response does not
/// wait on the webhook.
pub async fn capture_lead(
    State(state): State<Arc<AppState>>,
    Json(lead): Json<Lead>,
) -> Result<impl IntoResponse, ApiError> {
    if lead.name.trim().is_empty() || lead.email.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Lead name and email are required".to_string(),
        ));
    }

    dispatch_lead(state.webhook.clone(), lead);

    Ok(Json(json!({
        "status": "accepted",
        "message": "Lead capture queued",
    })))
}

pub async fn log_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatLogRequest>,
) -> impl IntoResponse {
    state.sessions.touch(&payload.session_id).await;
    dispatch_chat_log(
        state.webhook.clone(),
        payload.session_id,
        payload.chat_history,
        payload.user_info,
    );

    Json(json!({ "status": "accepted" }))
}
