use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use gtmscout_core::errors::ApplicationError;
use tokio::sync::{Mutex, RwLock};

use crate::session::{GtmSession, SessionIds};

pub type SharedSession = Arc<Mutex<GtmSession>>;

struct RegistryEntry {
    session: SharedSession,
    /// Milliseconds since the registry epoch at the last lookup.
    last_seen_ms: AtomicU64,
}

/// Live sessions keyed by thread id.
///
/// Each session sits behind its own mutex, so messages for one thread are handled one at a
/// time while different threads proceed independently. Sessions that go unused for longer
/// than the idle window are dropped by [`SessionRegistry::evict_idle`].
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, RegistryEntry>>,
    epoch: Instant,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self { sessions: RwLock::new(HashMap::new()), epoch: Instant::now() }
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn entry(&self, session: SharedSession) -> RegistryEntry {
        RegistryEntry { session, last_seen_ms: AtomicU64::new(self.now_ms()) }
    }

    /// Returns the session for `ids.thread_id`, creating it when absent.
    pub async fn open(&self, ids: SessionIds) -> SharedSession {
        let mut sessions = self.sessions.write().await;
        let now = self.now_ms();
        let entry = sessions
            .entry(ids.thread_id.clone())
            .or_insert_with(|| self.entry(Arc::new(Mutex::new(GtmSession::new(ids)))));
        entry.last_seen_ms.store(now, Ordering::Relaxed);
        entry.session.clone()
    }

    /// Opens a session under caller-supplied ids, generating any that are missing.
    pub async fn create(
        &self,
        user_id: Option<String>,
        thread_id: Option<String>,
    ) -> Result<SharedSession, ApplicationError> {
        let ids = SessionIds::parse(user_id, thread_id)?;
        Ok(self.open(ids).await)
    }

    pub async fn get(&self, thread_id: &str) -> Result<SharedSession, ApplicationError> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(thread_id)
            .ok_or_else(|| ApplicationError::SessionNotFound(thread_id.to_string()))?;
        entry.last_seen_ms.store(self.now_ms(), Ordering::Relaxed);
        Ok(entry.session.clone())
    }

    /// Drops `thread_id` and starts a fresh session under newly generated identifiers.
    pub async fn reset(&self, thread_id: &str) -> Result<SharedSession, ApplicationError> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(thread_id).is_none() {
            return Err(ApplicationError::SessionNotFound(thread_id.to_string()));
        }

        let ids = SessionIds::new(None, None);
        let session = Arc::new(Mutex::new(GtmSession::new(ids.clone())));
        sessions.insert(ids.thread_id, self.entry(session.clone()));
        Ok(session)
    }

    /// Removes sessions not looked up within `idle` and returns their thread ids.
    pub async fn evict_idle(&self, idle: Duration) -> Vec<String> {
        let idle_ms = u64::try_from(idle.as_millis()).unwrap_or(u64::MAX);
        let now = self.now_ms();
        let mut sessions = self.sessions.write().await;

        let expired = sessions
            .iter()
            .filter(|(_, entry)| {
                now.saturating_sub(entry.last_seen_ms.load(Ordering::Relaxed)) >= idle_ms
            })
            .map(|(thread_id, _)| thread_id.clone())
            .collect::<Vec<_>>();
        for thread_id in &expired {
            sessions.remove(thread_id);
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
