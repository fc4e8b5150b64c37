use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    entities::{
        preferences::ViewPreferences, session::UploadSession, transformation::DisplayOptions,
    },
    errors::SessionError,
    use_cases::export::ExportTracker,
};

/// Everything one browser tab works with.
#[derive(Debug)]
pub struct StudioSession {
    pub uploads: UploadSession,
    pub options: DisplayOptions,
    pub preferences: ViewPreferences,
    pub export: Arc<ExportTracker>,
    touched_at: Instant,
}

impl StudioSession {
    fn new() -> Self {
        StudioSession {
            uploads: UploadSession::new(),
            options: DisplayOptions::default(),
            preferences: ViewPreferences::default(),
            export: Arc::new(ExportTracker::new()),
            touched_at: Instant::now(),
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.touched_at.elapsed()
    }
}

/// In-memory studio sessions keyed by id. Entry locks are never held
/// across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Mutex<StudioSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, Arc::new(Mutex::new(StudioSession::new())));
        id
    }

    /// Runs `f` against a session and marks it as recently used.
    pub fn with_session<F, R>(&self, id: &Uuid, f: F) -> Result<R, SessionError>
    where
        F: FnOnce(&mut StudioSession) -> R,
    {
        let entry = self
            .sessions
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .ok_or(SessionError::SessionNotFound(*id))?;

        let mut session = entry.lock();
        session.touched_at = Instant::now();
        Ok(f(&mut session))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Whether the session still exists and has not been cleared since
    /// `generation` was read.
    pub fn is_live(&self, id: &Uuid, generation: u64) -> bool {
        self.sessions
            .get(id)
            .map(|e| Arc::clone(e.value()))
            .is_some_and(|entry| entry.lock().uploads.generation() == generation)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than `ttl`, sparing ones mid-export.
    pub fn purge_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| {
            let session = entry.lock();
            session.idle_for() < ttl || session.export.is_busy()
        });
        before.saturating_sub(self.sessions.len())
    }
}
