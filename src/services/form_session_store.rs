use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use uuid::Uuid;

use crate::models::FormSession;

pub type SharedFormSession = Arc<Mutex<FormSession>>;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug)]
struct Entry {
    session: SharedFormSession,
    last_touched: Instant,
}

/// In-memory registry of open form sessions.
///
/// Each session has its own mutex; a change event holds it for its whole
/// run, so events on one form apply strictly one after another.
///
/// Browsers that navigate away rarely say so, so idle sessions expire after
/// `ttl` and the registry never holds more than `max_sessions`; opening one
/// past the cap drops the least recently touched.
#[derive(Debug, Clone)]
pub struct FormSessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for FormSessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl FormSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn open(&self, record_id: Option<i32>) -> FormSession {
        let session = FormSession::new(record_id);
        let snapshot = session.clone();

        let mut sessions = self.sessions.write().await;

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(id, _)| *id);

            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    tracing::debug!(session_id = %id, "Form session evicted to make room");
                }
                None => break,
            }
        }

        sessions.insert(
            session.id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_touched: Instant::now(),
            },
        );

        snapshot
    }

    /// Looks a session up and marks it as used.
    pub async fn get(&self, id: Uuid) -> Option<SharedFormSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_touched = Instant::now();

        Some(entry.session.clone())
    }

    pub async fn close(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than the ttl. A session whose change
    /// event is still running is kept.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, entry| {
            now.duration_since(entry.last_touched) <= self.ttl || entry.session.try_lock().is_err()
        });

        before - sessions.len()
    }

    /// Runs `evict_idle` on a fixed interval until the runtime shuts down.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Expired idle form sessions");
                }
            }
        })
    }
}
