use serde_json::{json, Value};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable and friendly product assistant. \
Answer customer questions accurately and concisely, grounding every answer in the uploaded product \
documentation whenever it is available. If the documentation does not cover a question, say so \
honestly instead of guessing. Keep answers short, practical, and polite, and invite the customer \
to leave contact details when they show purchase intent.";

/// Configuration written to `config.yml` on first startup. Every value here
/// can be overridden by editing the file or by entries in `secrets.yml`.
pub fn generate_default_config() -> Value {
    json!({
        "server": {
            "host": "127.0.0.1",
            "port": 8000,
            "cors_allowed_origins": [],
            "max_upload_bytes": 10_485_760u64,
        },
        "provider": {
            "base_url": "https://api.openai.com",
            "chat_model": "gpt-4o-mini",
            "embedding_model": "text-embedding-3-small",
            "request_timeout_secs": 60,
        },
        "chunker": {
            "chunk_size": 1024,
            "overlap": 128,
        },
        "retrieval": {
            "top_k": 3,
            "cache_ttl_secs": 600,
            "cache_max_entries": 100,
            "embedding_cache_size": 500,
        },
        "sessions": {
            "idle_timeout_secs": 3600,
            "max_turns": 5,
        },
        "generation": {
            "deadline_secs": 50,
            "temperature": 0.7,
            "max_tokens": 500,
            "top_p": 0.95,
        },
        "assistant": {
            "system_prompt": DEFAULT_SYSTEM_PROMPT,
        },
        "webhook": {
            "timeout_secs": 10,
        },
    })
}
