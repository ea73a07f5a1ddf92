use super::controller::{InterviewSession, SessionId};
use crate::config::SessionsConfig;
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Exclusive handle on one session, released on drop
pub type SessionGuard = OwnedMutexGuard<InterviewSession>;

struct StoreEntry {
    session: Arc<AsyncMutex<InterviewSession>>,
    last_access: Instant,
}

impl StoreEntry {
    /// Terminal and not held by anyone
    fn is_evictable(&self) -> bool {
        self.session
            .try_lock()
            .map(|session| session.state().is_terminal())
            .unwrap_or(false)
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_access.elapsed() >= ttl && self.session.try_lock().is_ok()
    }
}

/// In-memory table of live interview sessions.
///
/// Each session sits behind its own async mutex. `acquire` never queues: a
/// session already held by another request is reported as busy.
pub struct SessionStore {
    entries: Mutex<HashMap<SessionId, StoreEntry>>,
    max_sessions: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_sessions,
            idle_ttl,
        }
    }

    pub fn from_config(config: &SessionsConfig) -> Self {
        Self::new(config.max_sessions, config.idle_ttl())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SessionId, StoreEntry>> {
        // The table holds no invariants a panicking holder could break
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a session, evicting idle or finished ones to make room
    pub fn insert(&self, session: InterviewSession) -> Result<SessionId, EngineError> {
        let id = session.id();
        let mut entries = self.entries();

        let expired = evict_idle(&mut entries, self.idle_ttl);
        if expired > 0 {
            tracing::debug!("Evicted {} idle sessions", expired);
        }

        if entries.len() >= self.max_sessions {
            let victim = entries
                .iter()
                .filter(|(_, entry)| entry.is_evictable())
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(id, _)| *id);

            match victim {
                Some(victim) => {
                    entries.remove(&victim);
                    tracing::debug!("Evicted finished session {} to make room", victim);
                }
                None => {
                    tracing::warn!("Session store full ({} sessions)", self.max_sessions);
                    return Err(EngineError::StoreFull {
                        capacity: self.max_sessions,
                    });
                }
            }
        }

        entries.insert(
            id,
            StoreEntry {
                session: Arc::new(AsyncMutex::new(session)),
                last_access: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Take exclusive access to a session
    pub fn acquire(&self, id: SessionId) -> Result<SessionGuard, EngineError> {
        let mut entries = self.entries();
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| EngineError::SessionNotFound(id.to_string()))?;

        entry.last_access = Instant::now();
        Arc::clone(&entry.session)
            .try_lock_owned()
            .map_err(|_| EngineError::SessionBusy(id.to_string()))
    }

    pub fn remove(&self, id: SessionId) -> bool {
        self.entries().remove(&id).is_some()
    }

    /// Drop every unlocked session idle for longer than the TTL
    pub fn evict_expired(&self) -> usize {
        evict_idle(&mut self.entries(), self.idle_ttl)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_sessions
    }
}

fn evict_idle(entries: &mut HashMap<SessionId, StoreEntry>, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_idle(ttl));
    before - entries.len()
}
