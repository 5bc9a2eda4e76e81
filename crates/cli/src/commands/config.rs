use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sitequote_core::config::{AppConfig, LoadOptions};
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

/// Effective configuration with the layer each value came from.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let entries = effective_entries(&config, detect_config_path().as_deref());
    let data = serde_json::to_value(&entries).ok();
    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: override > env > file > default)",
        data,
    )
}

fn effective_entries(config: &AppConfig, config_file_path: Option<&Path>) -> Vec<ConfigEntry> {
    let doc = load_config_file_doc(config_file_path);
    let entry = |key: &'static str, value: String, env_keys: &[&str]| ConfigEntry {
        key,
        value,
        source: field_source(key, env_keys, doc.as_ref(), config_file_path),
    };

    vec![
        entry("database.url", config.database.url.clone(), &["SITEQUOTE_DATABASE_URL"]),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["SITEQUOTE_DATABASE_MAX_CONNECTIONS"],
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["SITEQUOTE_DATABASE_TIMEOUT_SECS"],
        ),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["SITEQUOTE_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["SITEQUOTE_SERVER_PORT", "PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["SITEQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "server.max_drafts",
            config.server.max_drafts.to_string(),
            &["SITEQUOTE_SERVER_MAX_DRAFTS"],
        ),
        entry(
            "server.draft_ttl_secs",
            config.server.draft_ttl_secs.to_string(),
            &["SITEQUOTE_SERVER_DRAFT_TTL_SECS"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["SITEQUOTE_LOGGING_LEVEL", "SITEQUOTE_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["SITEQUOTE_LOGGING_FORMAT", "SITEQUOTE_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("sitequote.toml"), PathBuf::from("config/sitequote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
