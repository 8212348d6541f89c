//! Browser session registry
//!
//! Each signed-in browser is addressed by an opaque cookie and owns its
//! credential store, its per-entity list caches and the cancellation token of
//! its session guard. Sessions idle for longer than the configured timeout
//! are swept, which also stops their guards.

use campus_admin_client::{CredentialStore, Session};
use campus_admin_core::{Upload, list::LocalCollection, schema::EntitySchema};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// State held for one browser
#[derive(Debug)]
pub struct BrowserSession {
    id: Uuid,
    credentials: Arc<CredentialStore>,
    collections: Mutex<HashMap<&'static str, LocalCollection>>,
    drafts: Mutex<HashMap<Uuid, Vec<Upload>>>,
    guard_cancel: Mutex<Option<CancellationToken>>,
    last_seen: Mutex<Instant>,
}

impl BrowserSession {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            credentials: Arc::new(CredentialStore::new()),
            collections: Mutex::new(HashMap::new()),
            drafts: Mutex::new(HashMap::new()),
            guard_cancel: Mutex::new(None),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Cookie value identifying this browser
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Persisted `authToken`/`userData` pair
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Explicit session for backend calls, if signed in
    pub fn session(&self) -> Option<Session> {
        self.credentials.session()
    }

    /// Run `f` against the cached collection of one entity
    pub fn with_collection<R>(
        &self,
        schema: &EntitySchema,
        f: impl FnOnce(&mut LocalCollection) -> R,
    ) -> R {
        let mut collections = self.collections.lock();
        f(collections.entry(schema.slug).or_default())
    }

    /// Keep files chosen on a form that is being shown again
    pub fn stash_uploads(&self, draft: Uuid, uploads: Vec<Upload>) {
        self.drafts.lock().insert(draft, uploads);
    }

    /// Take back the files kept under `draft`
    pub fn take_uploads(&self, draft: Uuid) -> Vec<Upload> {
        self.drafts.lock().remove(&draft).unwrap_or_default()
    }

    /// Record activity from this browser
    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Time since the last request from this browser
    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }

    /// Replace the running guard's cancellation token, cancelling the old one
    pub fn set_guard(&self, cancel: CancellationToken) {
        if let Some(previous) = self.guard_cancel.lock().replace(cancel) {
            previous.cancel();
        }
    }

    /// Sign out locally: clear both credential keys, stop the guard and
    /// drop every cached list
    pub fn end(&self) {
        self.credentials.clear();
        if let Some(cancel) = self.guard_cancel.lock().take() {
            cancel.cancel();
        }
        self.collections.lock().clear();
        self.drafts.lock().clear();
        debug!(session = %self.id, "browser session ended");
    }
}

/// All known browser sessions
#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, Arc<BrowserSession>>>,
}

impl SessionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new browser session
    pub fn create(&self) -> Arc<BrowserSession> {
        let session = Arc::new(BrowserSession::new(Uuid::new_v4()));
        self.sessions.insert(session.id(), Arc::clone(&session));
        session
    }

    /// Look up a browser session by its cookie value
    pub fn get(&self, raw_id: &str) -> Option<Arc<BrowserSession>> {
        let id = Uuid::parse_str(raw_id).ok()?;
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// End and forget a browser session
    pub fn remove(&self, id: Uuid) {
        if let Some((_, session)) = self.sessions.remove(&id) {
            session.end();
        }
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are registered
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// End and forget every session idle for at least `idle_timeout`
    ///
    /// Returns how many were dropped.
    pub fn sweep_idle(&self, idle_timeout: Duration) -> usize {
        let idle: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_for() >= idle_timeout)
            .map(|entry| *entry.key())
            .collect();

        for id in &idle {
            self.remove(*id);
        }
        idle.len()
    }

    /// Sweep idle sessions periodically until `cancel` fires
    pub fn spawn_sweeper(
        &self,
        idle_timeout: Duration,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let dropped = registry.sweep_idle(idle_timeout);
                        if dropped > 0 {
                            info!(dropped, remaining = registry.len(), "dropped idle browser sessions");
                        }
                    }
                }
            }
        })
    }

    /// End every session, stopping all guards
    pub fn shutdown(&self) {
        for entry in self.sessions.iter() {
            entry.value().end();
        }
        self.sessions.clear();
    }
}
