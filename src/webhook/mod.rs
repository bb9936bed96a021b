use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::config::WebhookSettings;
use crate::core::errors::ApiError;

/// Messages included in the chat summary attached to a lead.
const SUMMARY_MESSAGE_LIMIT: usize = 10;

/// Per-message content cap in the chat summary.
const SUMMARY_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub interested_products: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<Value>,
}

/// Best-effort delivery of leads and chat logs to a configured CRM webhook.
///
/// Delivery happens off the request path via `dispatch_lead` and
/// `dispatch_chat_log`; failures are logged and never reach the caller.
pub struct WebhookClient {
    url: Option<String>,
    secret: Option<String>,
    client: Client,
}

impl WebhookClient {
    pub fn new(settings: WebhookSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ApiError::internal)?;
        Ok(Self {
            url: settings.url,
            secret: settings.secret,
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    pub async fn send_lead(&self, lead: &Lead) -> bool {
        let Some(url) = &self.url else {
            tracing::warn!("Lead received but no webhook URL is configured");
            return false;
        };

        let (first_name, last_name) = split_full_name(&lead.name);
        let payload = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "lead": {
                "first_name": first_name,
                "last_name": last_name,
                "email": lead.email,
                "phone": lead.phone.as_deref().unwrap_or("").trim(),
                "message": lead.message.as_deref().unwrap_or(""),
                "source": "DocuChat Assistant",
                "interested_products": lead.interested_products,
                "session_id": lead.session_id.as_deref().unwrap_or(""),
            },
            "chat_summary": summarize_history(&lead.chat_history),
            "metadata": {
                "channel": "web_chat",
                "platform": "docuchat",
            },
        });

        self.post(url, &payload, "lead").await
    }

    pub async fn send_chat_log(
        &self,
        session_id: &str,
        history: &[Value],
        user_info: Option<&Value>,
    ) -> bool {
        let Some(url) = &self.url else {
            return false;
        };

        let payload = json!({
            "type": "chat_log",
            "timestamp": Utc::now().to_rfc3339(),
            "session_id": session_id,
            "chat_history": history,
            "user_info": user_info.cloned().unwrap_or_else(|| json!({})),
            "metadata": {
                "total_messages": history.len(),
                "duration": chat_duration_seconds(history),
            },
        });

        self.post(url, &payload, "chat log").await
    }

    async fn post(&self, url: &str, payload: &Value, what: &str) -> bool {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::USER_AGENT, "docuchat-webhook/1.0")
            .json(payload);
        if let Some(secret) = &self.secret {
            request = request.header("X-Webhook-Secret", secret);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Delivered {} to webhook", what);
                true
            }
            Ok(response) => {
                tracing::warn!("Webhook rejected {}: {}", what, response.status());
                false
            }
            Err(err) => {
                tracing::warn!("Webhook delivery of {} failed: {}", what, err);
                false
            }
        }
    }
}

/// Queues a lead for delivery without tying up the request.
pub fn dispatch_lead(client: Arc<WebhookClient>, lead: Lead) {
    tokio::spawn(async move {
        client.send_lead(&lead).await;
    });
}

/// Queues a chat log for delivery without tying up the request.
pub fn dispatch_chat_log(
    client: Arc<WebhookClient>,
    session_id: String,
    history: Vec<Value>,
    user_info: Option<Value>,
) {
    tokio::spawn(async move {
        client
            .send_chat_log(&session_id, &history, user_info.as_ref())
            .await;
    });
}

fn split_full_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn summarize_history(history: &[Value]) -> Vec<Value> {
    let start = history.len().saturating_sub(SUMMARY_MESSAGE_LIMIT);
    history[start..]
        .iter()
        .map(|message| {
            let content: String = message
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .chars()
                .take(SUMMARY_CONTENT_CHARS)
                .collect();
            json!({
                "role": message.get("role").and_then(|v| v.as_str()).unwrap_or("unknown"),
                "content": content,
                "timestamp": message.get("timestamp").and_then(|v| v.as_str()).unwrap_or(""),
            })
        })
        .collect()
}

fn chat_duration_seconds(history: &[Value]) -> i64 {
    if history.len() < 2 {
        return 0;
    }
    let timestamp_of = |message: &Value| -> Option<DateTime<chrono::FixedOffset>> {
        message
            .get("timestamp")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    };
    match (
        timestamp_of(&history[0]),
        timestamp_of(&history[history.len() - 1]),
    ) {
        (Some(first), Some(last)) => (last - first).num_seconds(),
        _ => 0,
    }
}
