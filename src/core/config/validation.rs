use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65_535)?;
        validate_string_array_field(server, "server.cors_allowed_origins", "cors_allowed_origins")?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            100_000_000,
        )?;
    }

    if let Some(provider) = expect_optional_object(root, "provider")? {
        validate_optional_string_field(provider, "provider.base_url", "base_url")?;
        validate_optional_string_field(provider, "provider.api_key", "api_key")?;
        validate_optional_string_field(provider, "provider.chat_model", "chat_model")?;
        validate_optional_string_field(provider, "provider.embedding_model", "embedding_model")?;
        validate_u64_field(
            provider,
            "provider.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(chunker) = expect_optional_object(root, "chunker")? {
        validate_u64_field(chunker, "chunker.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(chunker, "chunker.overlap", "overlap", 0, 1_000_000)?;

        let chunk_size = chunker.get("chunk_size").and_then(|v| v.as_u64());
        let overlap = chunker.get("overlap").and_then(|v| v.as_u64());
        if let (Some(chunk_size), Some(overlap)) = (chunk_size, overlap) {
            if overlap >= chunk_size {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'chunker.overlap': must be smaller than chunk_size ({} >= {})",
                    overlap, chunk_size
                )));
            }
        }
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 50)?;
        validate_u64_field(
            retrieval,
            "retrieval.cache_ttl_secs",
            "cache_ttl_secs",
            1,
            86_400,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.cache_max_entries",
            "cache_max_entries",
            1,
            100_000,
        )?;
        validate_u64_field(
            retrieval,
            "retrieval.embedding_cache_size",
            "embedding_cache_size",
            1,
            1_000_000,
        )?;
    }

    if let Some(sessions) = expect_optional_object(root, "sessions")? {
        validate_u64_field(
            sessions,
            "sessions.idle_timeout_secs",
            "idle_timeout_secs",
            1,
            604_800,
        )?;
        validate_u64_field(sessions, "sessions.max_turns", "max_turns", 1, 100)?;
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_u64_field(
            generation,
            "generation.deadline_secs",
            "deadline_secs",
            1,
            3_600,
        )?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(generation, "generation.max_tokens", "max_tokens", 1, 100_000)?;
        validate_f64_field(generation, "generation.top_p", "top_p", 0.0, 1.0)?;
    }

    if let Some(assistant) = expect_optional_object(root, "assistant")? {
        validate_optional_string_field(assistant, "assistant.system_prompt", "system_prompt")?;
    }

    if let Some(webhook) = expect_optional_object(root, "webhook")? {
        validate_optional_string_field(webhook, "webhook.url", "url")?;
        validate_optional_string_field(webhook, "webhook.secret", "secret")?;
        validate_u64_field(webhook, "webhook.timeout_secs", "timeout_secs", 1, 300)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::defaults::generate_default_config;
    use serde_json::json;

    #[test]
    fn default_config_passes_validation() {
        assert!(validate_config(&generate_default_config()).is_ok());
    }

    #[test]
    fn empty_config_passes_validation() {
        assert!(validate_config(&json!({})).is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let config = json!({ "chunker": { "chunk_size": 100, "overlap": 100 } });
        let err = validate_config(&config).expect_err("overlap must be rejected");
        assert!(err.to_string().contains("chunker.overlap"));
    }

    #[test]
    fn rejects_wrong_types_and_out_of_range_values() {
        let config = json!({ "retrieval": { "top_k": "three" } });
        assert!(validate_config(&config).is_err());

        let config = json!({ "generation": { "top_p": 1.5 } });
        assert!(validate_config(&config).is_err());

        let config = json!({ "server": { "port": 0 } });
        assert!(validate_config(&config).is_err());
    }
}
