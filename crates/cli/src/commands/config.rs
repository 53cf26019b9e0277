use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use gtmscout_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use super::CommandResult;

const COMMAND: &str = "config";

struct ConfigSource {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let path = detect_config_path();
    let source = ConfigSource { doc: load_config_file_doc(path.as_deref()), path };

    let memory_api_key = match &config.memory.api_key {
        Some(key) => redact_secret(key.expose_secret()),
        None => "<unset>".to_string(),
    };

    let entries: [(&str, String, &[&str]); 12] = [
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["GTMSCOUT_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["GTMSCOUT_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["GTMSCOUT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "server.session_idle_secs",
            config.server.session_idle_secs.to_string(),
            &["GTMSCOUT_SERVER_SESSION_IDLE_SECS"],
        ),
        ("memory.api_key", memory_api_key, &["GTMSCOUT_MEMORY_API_KEY", "ZEP_API_KEY"]),
        ("memory.base_url", config.memory.base_url.clone(), &["GTMSCOUT_MEMORY_BASE_URL"]),
        (
            "memory.timeout_secs",
            config.memory.timeout_secs.to_string(),
            &["GTMSCOUT_MEMORY_TIMEOUT_SECS"],
        ),
        (
            "matching.base_url",
            config.matching.base_url.clone(),
            &["GTMSCOUT_MATCHING_BASE_URL"],
        ),
        (
            "matching.timeout_secs",
            config.matching.timeout_secs.to_string(),
            &["GTMSCOUT_MATCHING_TIMEOUT_SECS"],
        ),
        (
            "matching.result_limit",
            config.matching.result_limit.to_string(),
            &["GTMSCOUT_MATCHING_RESULT_LIMIT"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["GTMSCOUT_LOGGING_LEVEL", "GTMSCOUT_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            &["GTMSCOUT_LOGGING_FORMAT", "GTMSCOUT_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in entries {
        lines.push(render_line(key, &value, field_source(key, env_keys, &source)));
    }

    CommandResult::text(lines.join("\n"))
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("gtmscout.toml"), PathBuf::from("config/gtmscout.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], source: &ConfigSource) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = &source.doc {
        if contains_path(doc, key_path) {
            let file_path = source
                .path
                .as_ref()
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_') {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}
