use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    error::Result,
    models::session::{AuthStatus, Session},
    repositories::token_storage::{StorageKeys, TokenStorage},
    services::{grid_view::GridView, session::SessionState},
};

/// A browser session and its auth state.
#[derive(Clone)]
pub struct RegisteredSession {
    pub session: Session,
    pub state: Arc<SessionState>,
    views: Arc<RwLock<HashMap<String, Arc<GridView>>>>,
}

impl RegisteredSession {
    fn new(session: Session, state: Arc<SessionState>) -> Self {
        Self {
            session,
            state,
            views: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The grid view behind one grid instance of page `slug`. Instances
    /// without an id share the page's default view.
    pub async fn view(&self, slug: &str, grid_id: Option<&str>) -> Arc<GridView> {
        let key = match grid_id {
            Some(grid_id) => format!("{}#{}", slug, grid_id),
            None => slug.to_string(),
        };

        if let Some(view) = self.views.read().await.get(&key) {
            return view.clone();
        }
        self.views
            .write()
            .await
            .entry(key)
            .or_insert_with(|| Arc::new(GridView::new()))
            .clone()
    }
}

/// Browser sessions by cookie id.
///
/// Entries are evicted as soon as their state publishes `Unauthenticated`,
/// and expired ones by `sweep_expired`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, RegisteredSession>>>,
    storage: Arc<dyn TokenStorage>,
    duration_days: i64,
}

impl SessionRegistry {
    pub fn new(storage: Arc<dyn TokenStorage>, duration_days: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            storage,
            duration_days,
        }
    }

    /// Registers a new, not yet authenticated session.
    pub async fn create(&self) -> RegisteredSession {
        let session = Session::new(self.duration_days);
        let state = Arc::new(SessionState::new(
            self.storage.clone(),
            StorageKeys::scoped(session.id),
        ));
        self.register(RegisteredSession::new(session, state)).await
    }

    /// Inserts `entry` unless its id is already registered, and returns the
    /// entry that ends up live.
    async fn register(&self, entry: RegisteredSession) -> RegisteredSession {
        let id = entry.session.id;
        let mut status = entry.state.subscribe();

        match self.sessions.write().await.entry(id) {
            Entry::Occupied(live) => return live.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
            }
        }

        let sessions = self.sessions.clone();
        let state = entry.state.clone();
        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                if *status.borrow_and_update() == AuthStatus::Unauthenticated {
                    let mut sessions = sessions.write().await;
                    if sessions
                        .get(&id)
                        .is_some_and(|live| Arc::ptr_eq(&live.state, &state))
                    {
                        sessions.remove(&id);
                        tracing::debug!("🧹 Session {} evicted", id);
                    }
                    break;
                }
            }
        });

        entry
    }

    /// Looks up an authenticated, unexpired session, restoring it from
    /// storage when this process has not seen it yet.
    ///
    /// # Arguments
    ///
    /// * `id` - The session id from the cookie.
    ///
    /// # Returns
    ///
    /// A `Result` containing the session, or `None` if it is not valid.
    pub async fn get(&self, id: Uuid) -> Result<Option<RegisteredSession>> {
        let known = self.sessions.read().await.get(&id).cloned();

        if let Some(entry) = known {
            if entry.session.is_expired() {
                tracing::warn!("❌ Session expired: {}", id);
                self.remove(id).await;
                return Ok(None);
            }
            return Ok(entry.state.is_authenticated().then_some(entry));
        }

        let state = SessionState::load(self.storage.clone(), StorageKeys::scoped(id)).await?;
        if !state.is_authenticated() {
            return Ok(None);
        }

        let created_at = Utc::now();
        let restored = RegisteredSession::new(
            Session {
                id,
                created_at,
                expires_at: created_at + chrono::Duration::days(self.duration_days),
            },
            Arc::new(state),
        );
        let entry = self.register(restored).await;
        tracing::info!("✅ Session {} restored from storage", id);

        Ok(entry.state.is_authenticated().then_some(entry))
    }

    /// Ends a session and forgets it.
    pub async fn remove(&self, id: Uuid) {
        let entry = self.sessions.write().await.remove(&id);
        if let Some(entry) = entry {
            entry.state.terminate().await;
        }
    }

    /// Ends and forgets every expired session.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub async fn sweep_expired(&self) -> usize {
        let expired: Vec<RegisteredSession> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, entry)| entry.session.is_expired())
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };

        for entry in &expired {
            entry.state.terminate().await;
        }
        expired.len()
    }

    /// Runs `sweep_expired` every `period` in the background.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = registry.sweep_expired().await;
                if removed > 0 {
                    tracing::info!("🧹 Swept {} expired sessions", removed);
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
