use serde::{Deserialize, Serialize};

use crate::session::ChatTurn;

/// Per-request sampling overrides. Anything unset falls back to the
/// configured generation defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSettings {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
    #[serde(default)]
    pub settings: ChatSettings,
}

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub passages_used: Vec<String>,
    pub processing_time_ms: u64,
}
