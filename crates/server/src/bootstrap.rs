use std::sync::Arc;
use std::time::Duration;

use gtmscout_agent::collaborators::{
    AgencyDirectory, ConversationMemory, DisabledMemory, HttpAgencyDirectory, ZepMemory,
};
use gtmscout_agent::runtime::AgentRuntime;
use gtmscout_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "starting application bootstrap"
    );

    let memory = conversation_memory(&config)?;
    info!(
        event_name = "system.bootstrap.memory_ready",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        memory_configured = memory.is_configured(),
        "conversation memory initialized"
    );

    let agencies = agency_directory(&config)?;
    info!(
        event_name = "system.bootstrap.matching_ready",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        matching_base_url = %config.matching.base_url,
        result_limit = config.matching.result_limit,
        "agency directory initialized"
    );

    let runtime = Arc::new(AgentRuntime::new(memory, agencies, config.matching.result_limit));
    Ok(Application { config, runtime })
}

fn conversation_memory(
    config: &AppConfig,
) -> Result<Arc<dyn ConversationMemory>, BootstrapError> {
    match config.memory.api_key.clone() {
        Some(api_key) if config.memory.is_configured() => {
            let client = http_client(config.memory.timeout_secs)?;
            Ok(Arc::new(ZepMemory::new(client, &config.memory.base_url, api_key)))
        }
        _ => Ok(Arc::new(DisabledMemory)),
    }
}

fn agency_directory(config: &AppConfig) -> Result<Arc<dyn AgencyDirectory>, BootstrapError> {
    let client = http_client(config.matching.timeout_secs)?;
    Ok(Arc::new(HttpAgencyDirectory::new(client, &config.matching.base_url)))
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, BootstrapError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)
}
