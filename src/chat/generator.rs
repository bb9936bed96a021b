use std::sync::Arc;
use std::time::Duration;

use super::prompt::build_messages;
use super::types::ChatSettings;
use crate::core::config::GenerationSettings;
use crate::core::errors::ApiError;
use crate::llm::{GenerationRequest, LlmProvider};
use crate::session::ChatTurn;

/// Runs generation calls with the configured persona and a hard deadline.
///
/// A call that outlives the deadline is abandoned and reported as a
/// timeout, never retried here; other provider failures are surfaced as
/// generation errors.
pub struct Generator {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    defaults: GenerationSettings,
}

impl Generator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: String,
        defaults: GenerationSettings,
    ) -> Self {
        Self {
            provider,
            system_prompt,
            defaults,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.defaults.deadline
    }

    pub async fn respond(
        &self,
        query: &str,
        passages: &[String],
        history: &[ChatTurn],
        settings: &ChatSettings,
    ) -> Result<String, ApiError> {
        let messages = build_messages(&self.system_prompt, passages, history, query);
        let request = GenerationRequest {
            messages,
            temperature: Some(settings.temperature.unwrap_or(self.defaults.temperature)),
            top_p: Some(settings.top_p.unwrap_or(self.defaults.top_p)),
            max_tokens: Some(settings.max_tokens.unwrap_or(self.defaults.max_tokens)),
        };

        match tokio::time::timeout(self.defaults.deadline, self.provider.chat(request)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(err)) => Err(ApiError::Generation(err.to_string())),
            Err(_) => Err(ApiError::GenerationTimeout(self.defaults.deadline.as_secs())),
        }
    }
}
