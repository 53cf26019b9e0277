use std::sync::Arc;
use std::time::Duration;

use gtmscout_core::domain::confirmation::ConfirmationRequest;
use gtmscout_core::domain::requirements::FieldName;
use gtmscout_core::errors::ApplicationError;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::collaborators::{
    AgencyDirectory, CollaboratorError, ConversationMemory, MemoryMessage, MemorySearchHit,
};
use crate::conversation::{ConversationExtractor, ExtractedFields};
use crate::registry::SessionRegistry;
use crate::reply::compose_reply;
use crate::session::{GtmSession, SessionIds, SessionSnapshot};

pub const DEFAULT_HISTORY_MESSAGES: usize = 10;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Everything a caller needs after one message was processed.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessOutcome {
    pub extracted: ExtractedFields,
    /// Confirmations raised by this message.
    pub confirmations: Vec<ConfirmationRequest>,
    /// Every confirmation still awaiting the user, including older ones.
    pub pending_confirmations: Vec<ConfirmationRequest>,
    pub matching_attempted: bool,
    pub state: SessionSnapshot,
    pub memory: MemoryReceipt,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatOutcome {
    pub reply: String,
    #[serde(flatten)]
    pub outcome: ProcessOutcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryReceipt {
    pub user_id: String,
    pub thread_id: String,
    pub configured: bool,
    pub user_message_stored: bool,
    pub summary_stored: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryHistory {
    pub user_id: String,
    pub thread_id: String,
    pub available: bool,
    pub history: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemorySearchResults {
    pub user_id: String,
    pub thread_id: String,
    pub available: bool,
    pub results: Vec<MemorySearchHit>,
}

/// Drives sessions: extraction, merge, agency matching and memory bookkeeping.
pub struct AgentRuntime {
    extractor: ConversationExtractor,
    registry: SessionRegistry,
    memory: Arc<dyn ConversationMemory>,
    agencies: Arc<dyn AgencyDirectory>,
    result_limit: u32,
}

impl AgentRuntime {
    pub fn new(
        memory: Arc<dyn ConversationMemory>,
        agencies: Arc<dyn AgencyDirectory>,
        result_limit: u32,
    ) -> Self {
        Self {
            extractor: ConversationExtractor::new(),
            registry: SessionRegistry::new(),
            memory,
            agencies,
            result_limit,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn memory_configured(&self) -> bool {
        self.memory.is_configured()
    }

    pub async fn create_session(
        &self,
        user_id: Option<String>,
        thread_id: Option<String>,
    ) -> Result<SessionSnapshot, ApplicationError> {
        let session = self.registry.create(user_id, thread_id).await?;
        let snapshot = session.lock().await.snapshot();
        info!(
            event_name = "agent.session.created",
            thread_id = %snapshot.thread_id,
            user_id = %snapshot.user_id,
            "session created"
        );
        Ok(snapshot)
    }

    pub async fn process_message(
        &self,
        thread_id: &str,
        message: &str,
    ) -> Result<ProcessOutcome, ApplicationError> {
        let session = self.registry.get(thread_id).await?;
        let mut session = session.lock().await;
        let ids = session.ids().clone();

        let user_message = MemoryMessage::user(message).with_metadata("type", json!("user_input"));
        let user_message_stored = self.remember(&ids, user_message).await;

        let extraction = self.extractor.extract(message);
        let confirmations = session.record_extraction(&extraction);

        let matching_attempted = session.qualifies_for_matching();
        if matching_attempted {
            self.refresh_agencies(&mut session).await;
        }

        let field_names =
            extraction.fields.field_names().iter().map(FieldName::as_str).collect::<Vec<_>>();
        let summary = MemoryMessage::assistant(format!(
            "Extracted: [{}]. Progress: {}%",
            field_names.join(", "),
            session.progress_percent()
        ))
        .with_metadata("type", json!("extraction_result"))
        .with_metadata("fields", json!(field_names));
        let summary_stored = self.remember(&ids, summary).await;

        info!(
            event_name = "agent.session.message_processed",
            thread_id = %ids.thread_id,
            extracted_fields = extraction.fields.len(),
            confirmations = confirmations.len(),
            progress_percent = session.progress_percent(),
            matching_attempted,
            "message processed"
        );

        Ok(ProcessOutcome {
            extracted: extraction.fields,
            confirmations,
            pending_confirmations: session.pending_confirmations().to_vec(),
            matching_attempted,
            state: session.snapshot(),
            memory: MemoryReceipt {
                user_id: ids.user_id,
                thread_id: ids.thread_id,
                configured: self.memory.is_configured(),
                user_message_stored,
                summary_stored,
            },
        })
    }

    /// Processes `message` and adds a composed assistant reply.
    pub async fn chat(
        &self,
        thread_id: &str,
        message: &str,
    ) -> Result<ChatOutcome, ApplicationError> {
        let outcome = self.process_message(thread_id, message).await?;
        let reply = compose_reply(&outcome.extracted, &outcome.state);
        Ok(ChatOutcome { reply, outcome })
    }

    pub async fn confirm(
        &self,
        thread_id: &str,
        field: &str,
    ) -> Result<FieldName, ApplicationError> {
        let field = field.parse::<FieldName>()?;
        let session = self.registry.get(thread_id).await?;
        let newly_confirmed = session.lock().await.confirm(field);

        info!(
            event_name = "agent.session.field_confirmed",
            thread_id = %thread_id,
            field = field.as_str(),
            newly_confirmed,
            "field confirmed"
        );
        Ok(field)
    }

    pub async fn correct(
        &self,
        thread_id: &str,
        field: &str,
        value: &str,
    ) -> Result<FieldName, ApplicationError> {
        let field = field.parse::<FieldName>()?;
        let session = self.registry.get(thread_id).await?;
        let mut session = session.lock().await;

        if let Err(error) = session.correct(field, value) {
            warn!(
                event_name = "agent.session.correction_rejected",
                thread_id = %thread_id,
                field = field.as_str(),
                error = %error,
                "correction rejected"
            );
            return Err(error.into());
        }

        info!(
            event_name = "agent.session.field_corrected",
            thread_id = %thread_id,
            field = field.as_str(),
            progress_percent = session.progress_percent(),
            "field corrected"
        );
        Ok(field)
    }

    pub async fn state(&self, thread_id: &str) -> Result<SessionSnapshot, ApplicationError> {
        let session = self.registry.get(thread_id).await?;
        let snapshot = session.lock().await.snapshot();
        Ok(snapshot)
    }

    pub async fn reset(&self, thread_id: &str) -> Result<SessionSnapshot, ApplicationError> {
        let session = self.registry.reset(thread_id).await?;
        self.memory.forget(thread_id).await;
        let snapshot = session.lock().await.snapshot();
        info!(
            event_name = "agent.session.reset",
            previous_thread_id = %thread_id,
            thread_id = %snapshot.thread_id,
            "session reset"
        );
        Ok(snapshot)
    }

    /// Drops sessions untouched for `idle` and returns how many were removed.
    pub async fn evict_idle_sessions(&self, idle: Duration) -> usize {
        let evicted = self.registry.evict_idle(idle).await;
        for thread_id in &evicted {
            self.memory.forget(thread_id).await;
            debug!(
                event_name = "agent.session.evicted",
                thread_id = %thread_id,
                idle_secs = idle.as_secs(),
                "idle session evicted"
            );
        }
        evicted.len()
    }

    pub async fn history(
        &self,
        thread_id: &str,
        last_n: usize,
    ) -> Result<MemoryHistory, ApplicationError> {
        let ids = self.session_ids(thread_id).await?;
        let (available, history) = match self.memory.context(&ids, last_n).await {
            Ok(history) => (true, history),
            Err(error) => {
                self.log_memory_failure(&ids, "context", &error);
                (false, String::new())
            }
        };

        Ok(MemoryHistory { user_id: ids.user_id, thread_id: ids.thread_id, available, history })
    }

    pub async fn search_history(
        &self,
        thread_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<MemorySearchResults, ApplicationError> {
        let ids = self.session_ids(thread_id).await?;
        let (available, results) = match self.memory.search(&ids, query, limit).await {
            Ok(results) => (true, results),
            Err(error) => {
                self.log_memory_failure(&ids, "search", &error);
                (false, Vec::new())
            }
        };

        Ok(MemorySearchResults {
            user_id: ids.user_id,
            thread_id: ids.thread_id,
            available,
            results,
        })
    }

    async fn session_ids(&self, thread_id: &str) -> Result<SessionIds, ApplicationError> {
        let session = self.registry.get(thread_id).await?;
        let ids = session.lock().await.ids().clone();
        Ok(ids)
    }

    async fn refresh_agencies(&self, session: &mut GtmSession) {
        let query = session.agency_query(self.result_limit);
        let agencies = match self.agencies.search(&query).await {
            Ok(agencies) => agencies,
            Err(error) => {
                warn!(
                    event_name = "agent.matching.search_failed",
                    thread_id = %session.thread_id(),
                    error = %error,
                    substituted = "empty agency list",
                    "agency search failed"
                );
                Vec::new()
            }
        };

        debug!(
            event_name = "agent.matching.results",
            thread_id = %session.thread_id(),
            agencies = agencies.len(),
            "agency matches stored"
        );
        session.replace_agencies(agencies);
    }

    async fn remember(&self, ids: &SessionIds, message: MemoryMessage) -> bool {
        match self.memory.append_message(ids, message).await {
            Ok(()) => true,
            Err(error) => {
                self.log_memory_failure(ids, "append", &error);
                false
            }
        }
    }

    fn log_memory_failure(
        &self,
        ids: &SessionIds,
        operation: &'static str,
        error: &CollaboratorError,
    ) {
        if matches!(error, CollaboratorError::Unconfigured) {
            debug!(
                event_name = "agent.memory.unconfigured",
                thread_id = %ids.thread_id,
                operation,
                "memory not configured"
            );
        } else {
            warn!(
                event_name = "agent.memory.operation_failed",
                thread_id = %ids.thread_id,
                operation,
                error = %error,
                "memory operation failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use gtmscout_core::domain::agency::{AgencyMatch, AgencySearchQuery};
    use gtmscout_core::domain::requirements::{Category, FieldName};
    use gtmscout_core::errors::{ApplicationError, DomainError};

    use super::AgentRuntime;
    use crate::collaborators::{
        AgencyDirectory, CollaboratorError, DisabledMemory, InMemoryConversationMemory,
        MessageRole,
    };

    #[derive(Default)]
    struct RecordingDirectory {
        queries: Mutex<Vec<AgencySearchQuery>>,
        fail: bool,
    }

    impl RecordingDirectory {
        fn failing() -> Self {
            Self { fail: true, ..Self::default() }
        }

        fn queries(&self) -> Vec<AgencySearchQuery> {
            self.queries.lock().expect("queries lock").clone()
        }
    }

    #[async_trait]
    impl AgencyDirectory for RecordingDirectory {
        async fn search(
            &self,
            query: &AgencySearchQuery,
        ) -> Result<Vec<AgencyMatch>, CollaboratorError> {
            self.queries.lock().expect("queries lock").push(query.clone());
            if self.fail {
                return Err(CollaboratorError::Transport("connection refused".to_string()));
            }
            Ok(vec![agency_fixture()])
        }
    }

    fn agency_fixture() -> AgencyMatch {
        AgencyMatch {
            id: 42,
            name: "Pipeline Partners".to_string(),
            slug: "pipeline-partners".to_string(),
            description: "Outbound for B2B SaaS".to_string(),
            headquarters: "London, UK".to_string(),
            specializations: vec!["B2B Marketing".to_string()],
            min_budget: Some(10_000),
            match_score: 88,
            match_reasons: vec!["B2B focus".to_string()],
            website: None,
        }
    }

    fn runtime_with(
        directory: Arc<RecordingDirectory>,
    ) -> (AgentRuntime, Arc<InMemoryConversationMemory>) {
        let memory = Arc::new(InMemoryConversationMemory::new());
        (AgentRuntime::new(memory.clone(), directory, 5), memory)
    }

    #[tokio::test]
    async fn first_message_extracts_and_confirms_without_matching() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, memory) = runtime_with(directory.clone());
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let outcome = runtime
            .process_message(
                &thread,
                "We're a B2B SaaS company in gaming using HubSpot, budget is $50k/month",
            )
            .await
            .expect("process");

        let pending = outcome.pending_confirmations.iter().map(|c| c.field).collect::<Vec<_>>();
        assert_eq!(pending, vec![FieldName::Industry, FieldName::Category, FieldName::Budget]);
        assert_eq!(outcome.state.progress_percent, 29);
        assert!(!outcome.matching_attempted);
        assert!(directory.queries().is_empty());

        let messages = memory.messages(&thread).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(
            messages[1].content,
            "Extracted: [industry, category, budget, tech_stack]. Progress: 29%"
        );
        assert!(outcome.memory.user_message_stored && outcome.memory.summary_stored);
    }

    #[tokio::test]
    async fn crossing_threshold_queries_directory_with_fallback_specializations() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory.clone());
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let outcome = runtime
            .process_message(&thread, "We're a sales-led B2B SaaS company with a $20k budget")
            .await
            .expect("process");

        assert_eq!(outcome.state.progress_percent, 43);
        assert_eq!(outcome.state.requirements.category, Some(Category::B2bSaas));
        assert!(outcome.matching_attempted);
        assert_eq!(outcome.state.matched_agencies.len(), 1);

        let queries = directory.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].specializations, vec!["B2B Marketing", "GTM"]);
        assert_eq!(queries[0].category_tags, vec!["B2B Marketing Agency"]);
        assert_eq!(queries[0].max_budget, Some(20_000));
        assert_eq!(queries[0].limit, 5);

        runtime.process_message(&thread, "we also need ABM").await.expect("process");
        let queries = directory.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].specializations, vec!["abm"]);
    }

    #[tokio::test]
    async fn message_without_signal_changes_nothing() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory.clone());
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;
        runtime.process_message(&thread, "we're in fintech").await.expect("process");

        let outcome = runtime.process_message(&thread, "hello there").await.expect("process");

        assert!(outcome.extracted.is_empty());
        assert!(outcome.confirmations.is_empty());
        assert_eq!(outcome.pending_confirmations.len(), 1);
        assert_eq!(outcome.state.progress_percent, 14);
        assert!(directory.queries().is_empty());
    }

    #[tokio::test]
    async fn failed_matching_degrades_to_empty_list() {
        let directory = Arc::new(RecordingDirectory::failing());
        let (runtime, _memory) = runtime_with(directory.clone());
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let outcome = runtime
            .process_message(&thread, "We're a sales-led B2B SaaS company with a $20k budget")
            .await
            .expect("failed matching must not fail the turn");

        assert!(outcome.matching_attempted);
        assert!(outcome.state.matched_agencies.is_empty());
        assert_eq!(directory.queries().len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_memory_is_reported_not_raised() {
        let directory = Arc::new(RecordingDirectory::default());
        let runtime = AgentRuntime::new(Arc::new(DisabledMemory), directory, 5);
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let outcome = runtime.process_message(&thread, "fintech").await.expect("process");
        assert!(!outcome.memory.configured);
        assert!(!outcome.memory.user_message_stored);

        let history = runtime.history(&thread, 10).await.expect("history");
        assert!(!history.available);
        assert!(history.history.is_empty());

        let search = runtime.search_history(&thread, "fintech", 5).await.expect("search");
        assert!(!search.available);
        assert!(search.results.is_empty());
    }

    #[tokio::test]
    async fn confirm_and_correct_follow_lifecycle() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;
        runtime
            .process_message(&thread, "B2B SaaS in fintech, budget of 30k")
            .await
            .expect("process");

        runtime.confirm(&thread, "industry").await.expect("confirm");
        runtime.correct(&thread, "budget", "$45,000").await.expect("correct");

        let state = runtime.state(&thread).await.expect("state");
        assert_eq!(state.requirements.budget, Some(45_000));
        assert_eq!(state.confirmed_fields, vec![FieldName::Industry, FieldName::Budget]);
        let pending = state.pending_confirmations.iter().map(|c| c.field).collect::<Vec<_>>();
        assert_eq!(pending, vec![FieldName::Category]);
    }

    #[tokio::test]
    async fn invalid_field_and_value_are_domain_errors() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let unknown = runtime.confirm(&thread, "favourite_colour").await;
        assert!(matches!(
            unknown,
            Err(ApplicationError::Domain(DomainError::UnknownField(ref name)))
                if name == "favourite_colour"
        ));

        let invalid = runtime.correct(&thread, "category", "b2c").await;
        assert!(matches!(
            invalid,
            Err(ApplicationError::Domain(DomainError::InvalidFieldValue { .. }))
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);

        let result = runtime.process_message("thread_missing", "hello").await;
        assert!(matches!(result, Err(ApplicationError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn chat_composes_reply_and_history_reads_back() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        let chat = runtime.chat(&thread, "hello there").await.expect("chat");
        assert_eq!(chat.reply, "Who's your target customer?");

        let history = runtime.history(&thread, 10).await.expect("history");
        assert!(history.available);
        assert_eq!(history.history, "USER: hello there\nASSISTANT: Extracted: []. Progress: 0%");
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_and_then_not_found() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);
        let thread = runtime.create_session(None, None).await.expect("create").thread_id;

        assert_eq!(runtime.evict_idle_sessions(Duration::from_secs(3600)).await, 0);
        assert_eq!(runtime.evict_idle_sessions(Duration::ZERO).await, 1);
        assert!(matches!(runtime.state(&thread).await, Err(ApplicationError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn supplied_thread_id_must_be_path_safe() {
        let directory = Arc::new(RecordingDirectory::default());
        let (runtime, _memory) = runtime_with(directory);

        let result = runtime.create_session(None, Some("thread?x=1".into())).await;
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::InvalidIdentifier { .. }))
        ));
        assert!(runtime.registry().is_empty().await);
    }
}
