use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::sync::{Mutex, OnceCell, RwLock};

use super::{join_url, CollaboratorError};
use crate::session::SessionIds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MemoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into(), metadata: Map::new() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into(), metadata: Map::new() }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemorySearchHit {
    pub content: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Append-and-search transcript store keyed by session thread.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    fn is_configured(&self) -> bool {
        true
    }

    async fn append_message(
        &self,
        session: &SessionIds,
        message: MemoryMessage,
    ) -> Result<(), CollaboratorError>;

    /// The last `last_n` messages rendered one per line as `ROLE: content`.
    async fn context(&self, session: &SessionIds, last_n: usize)
        -> Result<String, CollaboratorError>;

    async fn search(
        &self,
        session: &SessionIds,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemorySearchHit>, CollaboratorError>;

    /// Releases per-thread bookkeeping once a session is gone. Stored transcripts are kept.
    async fn forget(&self, _thread_id: &str) {}
}

fn render_transcript<'a>(messages: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    messages
        .into_iter()
        .map(|(role, content)| format!("{}: {content}", role.to_uppercase()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Memory used when no api key is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledMemory;

#[async_trait]
impl ConversationMemory for DisabledMemory {
    fn is_configured(&self) -> bool {
        false
    }

    async fn append_message(
        &self,
        _session: &SessionIds,
        _message: MemoryMessage,
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::Unconfigured)
    }

    async fn context(
        &self,
        _session: &SessionIds,
        _last_n: usize,
    ) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unconfigured)
    }

    async fn search(
        &self,
        _session: &SessionIds,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<MemorySearchHit>, CollaboratorError> {
        Err(CollaboratorError::Unconfigured)
    }
}

/// Process-local transcript store.
#[derive(Default)]
pub struct InMemoryConversationMemory {
    threads: RwLock<HashMap<String, Vec<MemoryMessage>>>,
}

impl InMemoryConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self, thread_id: &str) -> Vec<MemoryMessage> {
        let threads = self.threads.read().await;
        threads.get(thread_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn append_message(
        &self,
        session: &SessionIds,
        message: MemoryMessage,
    ) -> Result<(), CollaboratorError> {
        let mut threads = self.threads.write().await;
        threads.entry(session.thread_id.clone()).or_default().push(message);
        Ok(())
    }

    async fn context(
        &self,
        session: &SessionIds,
        last_n: usize,
    ) -> Result<String, CollaboratorError> {
        let threads = self.threads.read().await;
        let Some(messages) = threads.get(&session.thread_id) else {
            return Ok(String::new());
        };
        let start = messages.len().saturating_sub(last_n);
        Ok(render_transcript(
            messages[start..]
                .iter()
                .map(|message| (message.role.as_str(), message.content.as_str())),
        ))
    }

    /// Scores each message by the share of query terms it contains.
    async fn search(
        &self,
        session: &SessionIds,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemorySearchHit>, CollaboratorError> {
        let terms = query.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let threads = self.threads.read().await;
        let mut hits = threads
            .get(&session.thread_id)
            .into_iter()
            .flatten()
            .filter_map(|message| {
                let content = message.content.to_lowercase();
                let matched = terms.iter().filter(|term| content.contains(term.as_str())).count();
                (matched > 0).then(|| MemorySearchHit {
                    content: message.content.clone(),
                    score: matched as f64 / terms.len() as f64,
                    metadata: message.metadata.clone(),
                })
            })
            .collect::<Vec<_>>();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Zep v2 memory API.
///
/// Users and threads are created on first use; a thread is checked at most once per process.
/// Each thread initialises behind its own cell, so a slow lookup for one thread never holds
/// up another.
pub struct ZepMemory {
    client: Client,
    base_url: String,
    api_key: SecretString,
    initialized: Mutex<HashMap<String, Arc<OnceCell<()>>>>,
}

#[derive(Debug, Deserialize)]
struct ZepMemoryResponse {
    #[serde(default)]
    messages: Option<Vec<ZepMessage>>,
}

#[derive(Debug, Deserialize)]
struct ZepMessage {
    #[serde(default)]
    role_type: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ZepSearchResult {
    #[serde(default)]
    message: Option<ZepMessage>,
    #[serde(default)]
    score: Option<f64>,
}

impl ZepMemory {
    /// `client` carries the request timeout.
    pub fn new(client: Client, base_url: &str, api_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            initialized: Mutex::new(HashMap::new()),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Api-Key {}", self.api_key.expose_secret()))
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn ensure_session(&self, session: &SessionIds) -> Result<(), CollaboratorError> {
        let cell = {
            let mut initialized = self.initialized.lock().await;
            initialized.entry(session.thread_id.clone()).or_default().clone()
        };

        cell.get_or_try_init(|| async {
            self.ensure_exists(
                &format!("users/{}", session.user_id),
                "users",
                json!({ "user_id": session.user_id }),
            )
            .await?;
            self.ensure_exists(
                &format!("sessions/{}", session.thread_id),
                "sessions",
                json!({ "session_id": session.thread_id, "user_id": session.user_id }),
            )
            .await
        })
        .await?;
        Ok(())
    }

    async fn ensure_exists(
        &self,
        lookup_path: &str,
        create_path: &str,
        body: Value,
    ) -> Result<(), CollaboratorError> {
        let response = self.authorized(self.client.get(self.url(lookup_path))).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(CollaboratorError::Status(response.status().as_u16()));
        }

        let created =
            self.authorized(self.client.post(self.url(create_path))).json(&body).send().await?;
        if !created.status().is_success() {
            return Err(CollaboratorError::Status(created.status().as_u16()));
        }
        Ok(())
    }
}

fn check_status(status: StatusCode) -> Result<(), CollaboratorError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(CollaboratorError::Status(status.as_u16()))
    }
}

fn decode<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, CollaboratorError> {
    serde_json::from_slice(body).map_err(|error| CollaboratorError::Decode(error.to_string()))
}

fn transcript_from_zep(body: &[u8]) -> Result<String, CollaboratorError> {
    let memory: ZepMemoryResponse = decode(body)?;
    let messages = memory.messages.unwrap_or_default();
    Ok(render_transcript(messages.iter().map(|message| {
        (message.role_type.as_deref().unwrap_or("unknown"), message.content.as_str())
    })))
}

fn hits_from_zep(body: &[u8]) -> Result<Vec<MemorySearchHit>, CollaboratorError> {
    let results: Vec<ZepSearchResult> = decode(body)?;
    Ok(results
        .into_iter()
        .map(|result| {
            let (content, metadata) = match result.message {
                Some(message) => (message.content, message.metadata.unwrap_or_default()),
                None => (String::new(), Map::new()),
            };
            MemorySearchHit { content, score: result.score.unwrap_or_default(), metadata }
        })
        .collect())
}

#[async_trait]
impl ConversationMemory for ZepMemory {
    async fn append_message(
        &self,
        session: &SessionIds,
        message: MemoryMessage,
    ) -> Result<(), CollaboratorError> {
        self.ensure_session(session).await?;

        let body = json!({
            "messages": [{
                "role_type": message.role.as_str(),
                "content": message.content,
                "metadata": message.metadata,
            }]
        });
        let url = self.url(&format!("sessions/{}/memory", session.thread_id));
        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await?;
        check_status(response.status())
    }

    async fn context(
        &self,
        session: &SessionIds,
        last_n: usize,
    ) -> Result<String, CollaboratorError> {
        self.ensure_session(session).await?;

        let url = self.url(&format!("sessions/{}/memory", session.thread_id));
        let response = self
            .authorized(self.client.get(url))
            .query(&[("lastn", last_n)])
            .send()
            .await?;
        check_status(response.status())?;
        transcript_from_zep(&response.bytes().await?)
    }

    async fn search(
        &self,
        session: &SessionIds,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemorySearchHit>, CollaboratorError> {
        self.ensure_session(session).await?;

        let url = self.url(&format!("sessions/{}/search", session.thread_id));
        let response = self
            .authorized(self.client.post(url))
            .query(&[("limit", limit)])
            .json(&json!({ "text": query, "search_scope": "messages" }))
            .send()
            .await?;
        check_status(response.status())?;
        hits_from_zep(&response.bytes().await?)
    }

    async fn forget(&self, thread_id: &str) {
        self.initialized.lock().await.remove(thread_id);
    }
}
