use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub memory: MemoryConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    /// Sessions untouched this long are evicted; zero keeps them until reset.
    pub session_idle_secs: u64,
}

/// Conversation memory service. Without an api key the collaborator is unconfigured
/// and every memory operation reports itself unavailable.
#[derive(Clone, Debug)]
pub struct MemoryConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct MatchingConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub result_limit: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub memory_api_key: Option<String>,
    pub memory_base_url: Option<String>,
    pub matching_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` is required but does not exist")]
    MissingConfigFile(PathBuf),
    #[error("`${{{var}}}` is referenced in the config file but not set in the environment")]
    MissingEnvInterpolation { var: String },
    #[error("`${{` in the config file has no closing `}}`")]
    UnterminatedInterpolation,
    #[error("`{key}` must be a non-negative integer, got `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
                session_idle_secs: 3600,
            },
            memory: MemoryConfig {
                api_key: None,
                base_url: "https://api.getzep.com/api/v2".to_string(),
                timeout_secs: 10,
            },
            matching: MatchingConfig {
                base_url: "http://localhost:3001".to_string(),
                timeout_secs: 10,
                result_limit: 5,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl MemoryConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().map(|key| !key.expose_secret().trim().is_empty()).unwrap_or(false)
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("gtmscout.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(session_idle_secs) = server.session_idle_secs {
                self.server.session_idle_secs = session_idle_secs;
            }
        }

        if let Some(memory) = patch.memory {
            if let Some(api_key) = memory.api_key {
                self.memory.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = memory.base_url {
                self.memory.base_url = base_url;
            }
            if let Some(timeout_secs) = memory.timeout_secs {
                self.memory.timeout_secs = timeout_secs;
            }
        }

        if let Some(matching) = patch.matching {
            if let Some(base_url) = matching.base_url {
                self.matching.base_url = base_url;
            }
            if let Some(timeout_secs) = matching.timeout_secs {
                self.matching.timeout_secs = timeout_secs;
            }
            if let Some(result_limit) = matching.result_limit {
                self.matching.result_limit = result_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("GTMSCOUT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("GTMSCOUT_SERVER_PORT") {
            self.server.port = parse_u16("GTMSCOUT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("GTMSCOUT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("GTMSCOUT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("GTMSCOUT_SERVER_SESSION_IDLE_SECS") {
            self.server.session_idle_secs =
                parse_u64("GTMSCOUT_SERVER_SESSION_IDLE_SECS", &value)?;
        }

        let memory_api_key =
            read_env("GTMSCOUT_MEMORY_API_KEY").or_else(|| read_env("ZEP_API_KEY"));
        if let Some(value) = memory_api_key {
            self.memory.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("GTMSCOUT_MEMORY_BASE_URL") {
            self.memory.base_url = value;
        }
        if let Some(value) = read_env("GTMSCOUT_MEMORY_TIMEOUT_SECS") {
            self.memory.timeout_secs = parse_u64("GTMSCOUT_MEMORY_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("GTMSCOUT_MATCHING_BASE_URL") {
            self.matching.base_url = value;
        }
        if let Some(value) = read_env("GTMSCOUT_MATCHING_TIMEOUT_SECS") {
            self.matching.timeout_secs = parse_u64("GTMSCOUT_MATCHING_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("GTMSCOUT_MATCHING_RESULT_LIMIT") {
            self.matching.result_limit = parse_u32("GTMSCOUT_MATCHING_RESULT_LIMIT", &value)?;
        }

        let log_level =
            read_env("GTMSCOUT_LOGGING_LEVEL").or_else(|| read_env("GTMSCOUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("GTMSCOUT_LOGGING_FORMAT").or_else(|| read_env("GTMSCOUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(api_key) = overrides.memory_api_key {
            self.memory.api_key = Some(secret_value(api_key));
        }
        if let Some(base_url) = overrides.memory_base_url {
            self.memory.base_url = base_url;
        }
        if let Some(base_url) = overrides.matching_base_url {
            self.matching.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_memory(&self.memory)?;
        validate_matching(&self.matching)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("gtmscout.toml"), PathBuf::from("config/gtmscout.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &after[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
    validate_http_url("memory.base_url", &memory.base_url)?;
    validate_timeout("memory.timeout_secs", memory.timeout_secs)
}

fn validate_matching(matching: &MatchingConfig) -> Result<(), ConfigError> {
    validate_http_url("matching.base_url", &matching.base_url)?;
    validate_timeout("matching.timeout_secs", matching.timeout_secs)?;

    if matching.result_limit == 0 || matching.result_limit > 50 {
        return Err(ConfigError::Validation(
            "matching.result_limit must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    memory: Option<MemoryPatch>,
    matching: Option<MatchingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    session_idle_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchingPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    result_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
