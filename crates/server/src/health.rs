use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

const SERVICE_NAME: &str = "gtmscout";
const SERVICE_DESCRIPTION: &str =
    "Conversational GTM requirements gathering with agency matching";
const CAPABILITIES: &[&str] = &[
    "requirement_extraction",
    "soft_confirmations",
    "field_corrections",
    "industry_insights",
    "tool_recognition",
    "agency_matching",
    "conversation_memory",
];

#[derive(Clone)]
pub struct HealthState {
    memory_configured: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub memory: HealthCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub capabilities: Vec<&'static str>,
}

pub fn router(memory_configured: bool) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .with_state(HealthState { memory_configured })
}

pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    let memory = if state.memory_configured {
        HealthCheck { status: "configured", detail: "conversation memory enabled".to_string() }
    } else {
        HealthCheck {
            status: "disabled",
            detail: "no memory api key configured; history is not persisted".to_string(),
        }
    };

    Json(HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "gtmscout-server runtime initialized".to_string(),
        },
        memory,
        checked_at: Utc::now().to_rfc3339(),
    })
}

pub async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: SERVICE_NAME,
        description: SERVICE_DESCRIPTION,
        version: env!("CARGO_PKG_VERSION"),
        capabilities: CAPABILITIES.to_vec(),
    })
}
