use std::time::Duration;

use serde_json::Value;

use crate::core::config::defaults::DEFAULT_SYSTEM_PROMPT;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkerSettings {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub embedding_cache_size: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub max_turns: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub deadline: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub secret: Option<String>,
    pub timeout: Duration,
}

pub fn server_settings(config: &Value) -> ServerSettings {
    let host = read_string(config, "server", "host").unwrap_or_else(|| "127.0.0.1".to_string());
    let port = read_u64(config, "server", "port")
        .unwrap_or(8000)
        .clamp(1, 65_535) as u16;
    let max_upload_bytes = read_u64(config, "server", "max_upload_bytes")
        .unwrap_or(10_485_760)
        .clamp(1, 100_000_000) as usize;
    ServerSettings {
        host,
        port,
        max_upload_bytes,
    }
}

pub fn provider_settings(config: &Value) -> ProviderSettings {
    let base_url = read_string(config, "provider", "base_url")
        .unwrap_or_else(|| "https://api.openai.com".to_string());
    let api_key = read_string(config, "provider", "api_key")
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty());
    let chat_model =
        read_string(config, "provider", "chat_model").unwrap_or_else(|| "gpt-4o-mini".to_string());
    let embedding_model = read_string(config, "provider", "embedding_model")
        .unwrap_or_else(|| "text-embedding-3-small".to_string());
    let timeout_secs = read_u64(config, "provider", "request_timeout_secs")
        .unwrap_or(60)
        .clamp(1, 3_600);
    ProviderSettings {
        base_url,
        api_key,
        chat_model,
        embedding_model,
        request_timeout: Duration::from_secs(timeout_secs),
    }
}

pub fn chunker_settings(config: &Value) -> ChunkerSettings {
    let chunk_size = read_u64(config, "chunker", "chunk_size")
        .unwrap_or(1024)
        .clamp(1, 1_000_000) as usize;
    let overlap = read_u64(config, "chunker", "overlap")
        .unwrap_or(128)
        .clamp(0, 1_000_000) as usize;
    ChunkerSettings {
        chunk_size,
        overlap: overlap.min(chunk_size.saturating_sub(1)),
    }
}

pub fn retrieval_settings(config: &Value) -> RetrievalSettings {
    let top_k = read_u64(config, "retrieval", "top_k")
        .unwrap_or(3)
        .clamp(1, 50) as usize;
    let cache_ttl_secs = read_u64(config, "retrieval", "cache_ttl_secs")
        .unwrap_or(600)
        .clamp(1, 86_400);
    let cache_max_entries = read_u64(config, "retrieval", "cache_max_entries")
        .unwrap_or(100)
        .clamp(1, 100_000) as usize;
    let embedding_cache_size = read_u64(config, "retrieval", "embedding_cache_size")
        .unwrap_or(500)
        .clamp(1, 1_000_000) as usize;
    RetrievalSettings {
        top_k,
        cache_ttl: Duration::from_secs(cache_ttl_secs),
        cache_max_entries,
        embedding_cache_size,
    }
}

pub fn session_settings(config: &Value) -> SessionSettings {
    let idle_timeout_secs = read_u64(config, "sessions", "idle_timeout_secs")
        .unwrap_or(3_600)
        .clamp(1, 604_800);
    let max_turns = read_u64(config, "sessions", "max_turns")
        .unwrap_or(5)
        .clamp(1, 100) as usize;
    SessionSettings {
        idle_timeout: Duration::from_secs(idle_timeout_secs),
        max_turns,
    }
}

pub fn generation_settings(config: &Value) -> GenerationSettings {
    let deadline_secs = read_u64(config, "generation", "deadline_secs")
        .unwrap_or(50)
        .clamp(1, 3_600);
    let temperature = read_f64(config, "generation", "temperature")
        .unwrap_or(0.7)
        .clamp(0.0, 2.0) as f32;
    let max_tokens = read_u64(config, "generation", "max_tokens")
        .unwrap_or(500)
        .clamp(1, 100_000) as u32;
    let top_p = read_f64(config, "generation", "top_p")
        .unwrap_or(0.95)
        .clamp(0.0, 1.0) as f32;
    GenerationSettings {
        deadline: Duration::from_secs(deadline_secs),
        temperature,
        max_tokens,
        top_p,
    }
}

pub fn webhook_settings(config: &Value) -> WebhookSettings {
    let url = read_string(config, "webhook", "url")
        .or_else(|| std::env::var("CRM_WEBHOOK_URL").ok())
        .filter(|url| !url.trim().is_empty());
    let secret = read_string(config, "webhook", "secret")
        .or_else(|| std::env::var("WEBHOOK_SECRET").ok())
        .filter(|secret| !secret.trim().is_empty());
    let timeout_secs = read_u64(config, "webhook", "timeout_secs")
        .unwrap_or(10)
        .clamp(1, 300);
    WebhookSettings {
        url,
        secret,
        timeout: Duration::from_secs(timeout_secs),
    }
}

pub fn system_prompt(config: &Value) -> String {
    read_string(config, "assistant", "system_prompt")
        .filter(|prompt| !prompt.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}

fn read_u64(config: &Value, section: &str, key: &str) -> Option<u64> {
    config
        .get(section)
        .and_then(|section| section.get(key))
        .and_then(|value| value.as_u64())
}

fn read_f64(config: &Value, section: &str, key: &str) -> Option<f64> {
    config
        .get(section)
        .and_then(|section| section.get(key))
        .and_then(|value| value.as_f64())
}

fn read_string(config: &Value, section: &str, key: &str) -> Option<String> {
    config
        .get(section)
        .and_then(|section| section.get(key))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = json!({});

        let server = server_settings(&config);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 8000);
        assert_eq!(server.max_upload_bytes, 10_485_760);

        let chunker = chunker_settings(&config);
        assert_eq!(chunker.chunk_size, 1024);
        assert_eq!(chunker.overlap, 128);

        let retrieval = retrieval_settings(&config);
        assert_eq!(retrieval.top_k, 3);
        assert_eq!(retrieval.cache_ttl, Duration::from_secs(600));
        assert_eq!(retrieval.cache_max_entries, 100);
        assert_eq!(retrieval.embedding_cache_size, 500);

        let sessions = session_settings(&config);
        assert_eq!(sessions.idle_timeout, Duration::from_secs(3_600));
        assert_eq!(sessions.max_turns, 5);

        let generation = generation_settings(&config);
        assert_eq!(generation.deadline, Duration::from_secs(50));
        assert_eq!(generation.max_tokens, 500);

        assert_eq!(system_prompt(&config), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn populated_sections_are_read_and_clamped() {
        let config = json!({
            "server": { "host": "0.0.0.0", "port": 9100 },
            "chunker": { "chunk_size": 200, "overlap": 400 },
            "retrieval": { "top_k": 99, "cache_ttl_secs": 30 },
            "sessions": { "max_turns": 2 },
            "generation": { "deadline_secs": 5, "temperature": 9.0 },
            "assistant": { "system_prompt": "Answer tersely." }
        });

        let server = server_settings(&config);
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 9100);

        let chunker = chunker_settings(&config);
        assert_eq!(chunker.chunk_size, 200);
        assert_eq!(chunker.overlap, 199);

        let retrieval = retrieval_settings(&config);
        assert_eq!(retrieval.top_k, 50);
        assert_eq!(retrieval.cache_ttl, Duration::from_secs(30));

        assert_eq!(session_settings(&config).max_turns, 2);

        let generation = generation_settings(&config);
        assert_eq!(generation.deadline, Duration::from_secs(5));
        assert!((generation.temperature - 2.0).abs() < f32::EPSILON);

        assert_eq!(system_prompt(&config), "Answer tersely.");
    }

    #[test]
    fn webhook_settings_read_url_and_secret_from_config() {
        let config = json!({
            "webhook": { "url": "https://crm.example.com/hooks", "secret": "s3cret", "timeout_secs": 4 }
        });

        let webhook = webhook_settings(&config);
        assert_eq!(webhook.url.as_deref(), Some("https://crm.example.com/hooks"));
        assert_eq!(webhook.secret.as_deref(), Some("s3cret"));
        assert_eq!(webhook.timeout, Duration::from_secs(4));
    }
}
