//! Background-fetch session tracking.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use vitrine_core::Tick;

/// Lifecycle handle for one collection's background prefetch.
///
/// Cancellation is cooperative: loops poll `is_active` at each iteration and
/// before scheduling follow-up work. Work already in flight when the token
/// fires may still complete and its results still land in the cache.
#[derive(Clone, Debug)]
pub struct FetchSession {
    session_id: Uuid,
    tick: Tick,
    active: Arc<AtomicBool>,
    cancellation: CancellationToken,
}

impl FetchSession {
    fn new(tick: Tick) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            tick,
            active: Arc::new(AtomicBool::new(true)),
            cancellation: CancellationToken::new(),
        }
    }

    /// Unique id for log correlation.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The collection this session belongs to.
    pub fn tick(&self) -> &Tick {
        &self.tick
    }

    /// Whether the session may keep scheduling work.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst) && !self.cancellation.is_cancelled()
    }

    /// The session's cancellation token, for passing through async call
    /// boundaries.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Mark the session inactive and fire its cancellation token.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.cancellation.cancel();
    }
}

/// Tracks at most one canonical fetch session per collection.
pub struct FetchSessionRegistry {
    sessions: Mutex<HashMap<Tick, FetchSession>>,
}

impl FetchSessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Tick, FetchSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the existing active session for the tick, or create one.
    pub fn start(&self, tick: &Tick) -> FetchSession {
        let mut sessions = self.lock();
        if let Some(existing) = sessions.get(tick) {
            if existing.is_active() {
                return existing.clone();
            }
        }
        let session = FetchSession::new(tick.clone());
        tracing::debug!(tick = %tick, session_id = %session.session_id(), "Started fetch session");
        sessions.insert(tick.clone(), session.clone());
        session
    }

    /// The tracked session for a tick, if any (active or not).
    pub fn get(&self, tick: &Tick) -> Option<FetchSession> {
        self.lock().get(tick).cloned()
    }

    /// Cancel the session for one collection.
    pub fn cancel(&self, tick: &Tick) {
        if let Some(session) = self.lock().get(tick) {
            tracing::debug!(tick = %tick, session_id = %session.session_id(), "Cancelling fetch session");
            session.cancel();
        }
    }

    /// Cancel every tracked session.
    ///
    /// Invoked when the consumer begins an unrelated new search, so stale
    /// background writes stop racing a cache the consumer no longer cares
    /// about.
    pub fn cancel_all(&self) {
        let sessions = self.lock();
        if !sessions.is_empty() {
            tracing::debug!(count = sessions.len(), "Cancelling all fetch sessions");
        }
        for session in sessions.values() {
            session.cancel();
        }
    }

    /// Number of currently active sessions.
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|s| s.is_active()).count()
    }
}

impl Default for FetchSessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
