use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::generate_default_config;
use super::paths::AppPaths;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("DOCUCHAT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn config_write_path(&self) -> PathBuf {
        if let Ok(path) = env::var("DOCUCHAT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        self.paths.user_data_dir.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged view of the public config file and the secrets file. Missing or
    /// unparseable files degrade to an empty object; readers fall back to
    /// their own defaults.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let merged = deep_merge(&public_config, &secrets_config);
        Ok(merged)
    }

    /// Writes the built-in default configuration if no config file exists yet.
    pub fn ensure_default_config(&self) -> Result<(), ApiError> {
        if self.config_path().exists() {
            return Ok(());
        }

        let write_path = self.config_write_path();
        if let Some(parent) = write_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let yaml = serde_yaml::to_string(&generate_default_config()).map_err(ApiError::internal)?;
        fs::write(&write_path, yaml).map_err(ApiError::internal)?;
        tracing::info!("Wrote default configuration to {}", write_path.display());
        Ok(())
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(_) => Value::Object(Map::new()),
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn paths_in(dir: &TempDir) -> Arc<AppPaths> {
        Arc::new(AppPaths {
            project_root: dir.path().to_path_buf(),
            user_data_dir: dir.path().to_path_buf(),
            log_dir: dir.path().join("logs"),
            secrets_path: dir.path().join("secrets.yml"),
        })
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn secrets_file_overrides_public_config() {
        let dir = TempDir::new().expect("temp dir");
        let service = ConfigService::new(paths_in(&dir));

        std::fs::write(
            dir.path().join("config.yml"),
            "provider:\n  chat_model: gpt-4o-mini\n  api_key: public\n",
        )
        .expect("write config");
        std::fs::write(
            dir.path().join("secrets.yml"),
            "provider:\n  api_key: hidden\n",
        )
        .expect("write secrets");

        let config = service.load_config().expect("load");
        assert_eq!(config["provider"]["chat_model"], "gpt-4o-mini");
        assert_eq!(config["provider"]["api_key"], "hidden");
    }

    #[test]
    fn ensure_default_config_writes_file_once() {
        let dir = TempDir::new().expect("temp dir");
        let service = ConfigService::new(paths_in(&dir));

        service.ensure_default_config().expect("write defaults");
        let written = dir.path().join("config.yml");
        assert!(written.exists());

        let config = service.load_config().expect("load");
        assert_eq!(config["retrieval"]["top_k"], 3);
        assert_eq!(config["generation"]["deadline_secs"], 50);

        // A second call must not clobber user edits.
        std::fs::write(&written, "retrieval:\n  top_k: 7\n").expect("edit config");
        service.ensure_default_config().expect("no rewrite");
        let config = service.load_config().expect("reload");
        assert_eq!(config["retrieval"]["top_k"], 7);
    }

    #[test]
    fn missing_files_load_as_empty_object() {
        let dir = TempDir::new().expect("temp dir");
        let service = ConfigService::new(paths_in(&dir));

        let config = service.load_config().expect("load");
        assert_eq!(config, json!({}));
    }
}
