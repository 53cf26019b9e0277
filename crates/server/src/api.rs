//! Session routes.
//!
//! - `POST /sessions`: open a session
//! - `POST /sessions/{thread_id}/process`: extract requirements from a message
//! - `POST /sessions/{thread_id}/chat`: process plus a composed reply
//! - `POST /sessions/{thread_id}/confirm`: confirm a soft-confirmed field
//! - `POST /sessions/{thread_id}/correct`: overwrite a field with a user value
//! - `GET  /sessions/{thread_id}/state`: full session snapshot
//! - `POST /sessions/{thread_id}/reset`: replace the session with a fresh one
//! - `GET  /sessions/{thread_id}/memory/history`: stored transcript
//! - `POST /sessions/{thread_id}/memory/search`: search stored messages

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gtmscout_agent::runtime::{
    AgentRuntime, ChatOutcome, MemoryHistory, MemorySearchResults, ProcessOutcome,
    DEFAULT_HISTORY_MESSAGES, DEFAULT_SEARCH_LIMIT,
};
use gtmscout_agent::SessionSnapshot;
use gtmscout_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    runtime: Arc<AgentRuntime>,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{thread_id}/process", post(process_message))
        .route("/sessions/{thread_id}/chat", post(chat))
        .route("/sessions/{thread_id}/confirm", post(confirm_field))
        .route("/sessions/{thread_id}/correct", post(correct_field))
        .route("/sessions/{thread_id}/state", get(session_state))
        .route("/sessions/{thread_id}/reset", post(reset_session))
        .route("/sessions/{thread_id}/memory/history", get(memory_history))
        .route("/sessions/{thread_id}/memory/search", post(memory_search))
        .with_state(ApiState { runtime })
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub field: String,
}

#[derive(Debug, Deserialize)]
pub struct CorrectRequest {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub last_n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub user_id: String,
    pub thread_id: String,
    pub state: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct FieldStatus {
    pub status: &'static str,
    pub field: &'static str,
    pub state: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SessionReset {
    pub status: &'static str,
    pub previous_thread_id: String,
    pub user_id: String,
    pub thread_id: String,
    pub state: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error = match &self.0 {
            InterfaceError::BadRequest { message, .. }
            | InterfaceError::NotFound { message, .. } => message.clone(),
            other => other.user_message().to_string(),
        };
        let body = ErrorBody { error, correlation_id: self.0.correlation_id().to_string() };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn reject(error: ApplicationError, correlation_id: &str, thread_id: &str) -> ApiError {
    let interface = error.into_interface(correlation_id);
    match &interface {
        InterfaceError::Internal { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. } => error!(
            event_name = "api.request.failed",
            correlation_id = %correlation_id,
            thread_id = %thread_id,
            error = %message,
            "request failed"
        ),
        _ => warn!(
            event_name = "api.request.rejected",
            correlation_id = %correlation_id,
            thread_id = %thread_id,
            error = %interface,
            "request rejected"
        ),
    }
    ApiError(interface)
}

fn bad_request(message: impl Into<String>, correlation_id: &str, thread_id: &str) -> ApiError {
    let message = message.into();
    warn!(
        event_name = "api.request.invalid",
        correlation_id = %correlation_id,
        thread_id = %thread_id,
        error = %message,
        "invalid request"
    );
    ApiError(InterfaceError::BadRequest { message, correlation_id: correlation_id.to_string() })
}

fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    correlation_id: &str,
    thread_id: &str,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| bad_request(rejection.body_text(), correlation_id, thread_id))
}

fn non_empty_message(
    body: Result<Json<MessageRequest>, JsonRejection>,
    correlation_id: &str,
    thread_id: &str,
) -> Result<String, ApiError> {
    let request = json_body(body, correlation_id, thread_id)?;
    if request.message.trim().is_empty() {
        return Err(bad_request("message must not be empty", correlation_id, thread_id));
    }
    Ok(request.message)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn create_session(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<SessionCreated> {
    let correlation_id = correlation_id();
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice::<CreateSessionRequest>(&body)
            .map_err(|error| bad_request(error.to_string(), &correlation_id, "unknown"))?
    };

    let snapshot = state
        .runtime
        .create_session(request.user_id, request.thread_id)
        .await
        .map_err(|error| reject(error, &correlation_id, "unknown"))?;
    Ok(Json(SessionCreated {
        user_id: snapshot.user_id.clone(),
        thread_id: snapshot.thread_id.clone(),
        state: snapshot,
    }))
}

pub async fn process_message(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> ApiResult<ProcessOutcome> {
    let correlation_id = correlation_id();
    let message = non_empty_message(body, &correlation_id, &thread_id)?;

    state
        .runtime
        .process_message(&thread_id, &message)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, &thread_id))
}

pub async fn chat(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> ApiResult<ChatOutcome> {
    let correlation_id = correlation_id();
    let message = non_empty_message(body, &correlation_id, &thread_id)?;

    state
        .runtime
        .chat(&thread_id, &message)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, &thread_id))
}

pub async fn confirm_field(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    body: Result<Json<ConfirmRequest>, JsonRejection>,
) -> ApiResult<FieldStatus> {
    let correlation_id = correlation_id();
    let request = json_body(body, &correlation_id, &thread_id)?;
    let runtime = &state.runtime;

    let field = runtime
        .confirm(&thread_id, &request.field)
        .await
        .map_err(|error| reject(error, &correlation_id, &thread_id))?;
    let snapshot = runtime
        .state(&thread_id)
        .await
        .map_err(|error| reject(error, &correlation_id, &thread_id))?;

    Ok(Json(FieldStatus { status: "confirmed", field: field.as_str(), state: snapshot }))
}

pub async fn correct_field(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    body: Result<Json<CorrectRequest>, JsonRejection>,
) -> ApiResult<FieldStatus> {
    let correlation_id = correlation_id();
    let request = json_body(body, &correlation_id, &thread_id)?;
    let runtime = &state.runtime;

    let field = runtime
        .correct(&thread_id, &request.field, &request.value)
        .await
        .map_err(|error| reject(error, &correlation_id, &thread_id))?;
    let snapshot = runtime
        .state(&thread_id)
        .await
        .map_err(|error| reject(error, &correlation_id, &thread_id))?;

    Ok(Json(FieldStatus { status: "corrected", field: field.as_str(), state: snapshot }))
}

pub async fn session_state(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
) -> ApiResult<SessionSnapshot> {
    let correlation_id = correlation_id();
    state
        .runtime
        .state(&thread_id)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, &thread_id))
}

pub async fn reset_session(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
) -> ApiResult<SessionReset> {
    let correlation_id = correlation_id();
    let snapshot = state
        .runtime
        .reset(&thread_id)
        .await
        .map_err(|error| reject(error, &correlation_id, &thread_id))?;

    Ok(Json(SessionReset {
        status: "reset",
        previous_thread_id: thread_id,
        user_id: snapshot.user_id.clone(),
        thread_id: snapshot.thread_id.clone(),
        state: snapshot,
    }))
}

pub async fn memory_history(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<MemoryHistory> {
    let correlation_id = correlation_id();
    let last_n = query.last_n.unwrap_or(DEFAULT_HISTORY_MESSAGES);

    state
        .runtime
        .history(&thread_id, last_n)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, &thread_id))
}

pub async fn memory_search(
    State(state): State<ApiState>,
    Path(thread_id): Path<String>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<MemorySearchResults> {
    let correlation_id = correlation_id();
    let request = json_body(body, &correlation_id, &thread_id)?;
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty", &correlation_id, &thread_id));
    }
    let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

    state
        .runtime
        .search_history(&thread_id, &request.query, limit)
        .await
        .map(Json)
        .map_err(|error| reject(error, &correlation_id, &thread_id))
}
