//! In-memory registry of interview sessions.
//!
//! Each session sits behind its own async mutex. Handlers hold that lock for
//! the whole inference call, so a session never has two calls in flight.
//!
//! Sessions nobody has looked up for longer than the idle TTL are evicted by
//! a background sweep, which stands in for the browser tab going away.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;
use uuid::Uuid;

use crate::interview::session::Session;
use crate::llm_client::InferenceService;

/// A session together with the inference service bound to its credential.
pub struct SessionEntry {
    pub session: Session,
    pub llm: Arc<dyn InferenceService>,
}

pub type SessionHandle = Arc<Mutex<SessionEntry>>;

struct Slot {
    handle: SessionHandle,
    last_touched: Instant,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Slot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh Setup session and returns its id.
    pub async fn create(&self, llm: Arc<dyn InferenceService>) -> Uuid {
        let session = Session::new();
        let id = session.id();
        let slot = Slot {
            handle: Arc::new(Mutex::new(SessionEntry { session, llm })),
            last_touched: Instant::now(),
        };
        self.sessions.write().await.insert(id, slot);
        id
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions.get_mut(&id)?;
        slot.last_touched = Instant::now();
        Some(slot.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for longer than `ttl`. A session whose lock is
    /// held (an inference call in flight) is kept. Returns how many were evicted.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| {
            slot.last_touched.elapsed() <= ttl || slot.handle.try_lock().is_err()
        });
        before - sessions.len()
    }

    /// Runs `evict_idle` every `every` until the runtime shuts down.
    pub fn spawn_idle_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    let remaining = store.len().await;
                    info!(
                        evicted,
                        remaining,
                        "Evicted idle sessions"
                    );
                }
            }
        })
    }
}
