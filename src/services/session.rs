use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use zeroize::Zeroizing;

use crate::{
    error::{AppError, Result},
    models::session::{AuthStatus, Credentials},
    repositories::token_storage::{StorageKeys, TokenStorage},
};

/// Auth state of one session: the cached token pair, the storage it is
/// persisted to, and a watch channel publishing status changes.
///
/// Only `establish`, `replace_access` and `terminate` mutate it. Both tokens
/// are written and cleared together.
pub struct SessionState {
    storage: Arc<dyn TokenStorage>,
    keys: StorageKeys,
    credentials: RwLock<Option<Credentials>>,
    status: watch::Sender<AuthStatus>,
}

impl SessionState {
    /// Creates an empty, unauthenticated session.
    pub fn new(storage: Arc<dyn TokenStorage>, keys: StorageKeys) -> Self {
        let (status, _) = watch::channel(AuthStatus::Unauthenticated);
        Self {
            storage,
            keys,
            credentials: RwLock::new(None),
            status,
        }
    }

    /// Restores a session from persisted storage.
    ///
    /// A half-present pair (only one of the two tokens stored) is treated as
    /// an invalid session and cleared.
    ///
    /// # Arguments
    ///
    /// * `storage` - Where the tokens are persisted.
    /// * `keys` - The names the tokens are stored under.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SessionState`.
    pub async fn load(storage: Arc<dyn TokenStorage>, keys: StorageKeys) -> Result<Self> {
        let access = storage.get(&keys.access).await?;
        let refresh = storage.get(&keys.refresh).await?;
        let session = Self::new(storage, keys);

        match (access, refresh) {
            (Some(access), Some(refresh)) => {
                *session.credentials.write().await = Some(Credentials::new(access, refresh));
                session.status.send_replace(AuthStatus::Authenticated);
                tracing::debug!("🔑 Session restored from storage: {}", session.keys.access);
            }
            (None, None) => {}
            _ => {
                tracing::warn!("⚠️ Inconsistent token pair in storage, clearing");
                session.clear_storage().await;
            }
        }

        Ok(session)
    }

    /// Stores a freshly issued token pair.
    pub async fn establish(&self, credentials: Credentials) -> Result<()> {
        self.storage.set(&self.keys.access, &credentials.access).await?;
        self.storage.set(&self.keys.refresh, &credentials.refresh).await?;
        *self.credentials.write().await = Some(credentials);
        self.status.send_replace(AuthStatus::Authenticated);
        tracing::info!("✅ Session established");
        Ok(())
    }

    /// Swaps in the access token obtained from a refresh. The refresh token
    /// stays as it is.
    pub async fn replace_access(&self, access: String) -> Result<()> {
        {
            let mut credentials = self.credentials.write().await;
            let current = credentials.as_mut().ok_or(AppError::Unauthorized)?;
            current.access = Zeroizing::new(access);
            self.storage.set(&self.keys.access, &current.access).await?;
        }
        tracing::debug!("🔄 Access token replaced");
        Ok(())
    }

    /// Clears both tokens and publishes `Unauthenticated`.
    pub async fn terminate(&self) {
        *self.credentials.write().await = None;
        self.clear_storage().await;
        self.status.send_replace(AuthStatus::Unauthenticated);
        tracing::info!("👋 Session terminated");
    }

    async fn clear_storage(&self) {
        for key in [&self.keys.access, &self.keys.refresh] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::error!("❌ Failed to remove {} from storage: {}", key, e);
            }
        }
    }

    pub async fn access_token(&self) -> Option<Zeroizing<String>> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|credentials| credentials.access.clone())
    }

    pub async fn refresh_token(&self) -> Option<Zeroizing<String>> {
        self.credentials
            .read()
            .await
            .as_ref()
            .map(|credentials| credentials.refresh.clone())
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    /// Observer for status changes; the current value is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::token_storage::MemoryStorage;

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[tokio::test]
    async fn establish_persists_both_tokens() {
        let storage = memory();
        let session = SessionState::new(storage.clone(), StorageKeys::default());
        assert!(!session.is_authenticated());

        session.establish(Credentials::new("a1", "r1")).await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(storage.get("access_token").await.unwrap().as_deref(), Some("a1"));
        assert_eq!(storage.get("refresh_token").await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn replace_access_keeps_refresh() {
        let storage = memory();
        let session = SessionState::new(storage.clone(), StorageKeys::default());
        session.establish(Credentials::new("a1", "r1")).await.unwrap();

        session.replace_access("a2".to_string()).await.unwrap();

        assert_eq!(session.access_token().await.unwrap().as_str(), "a2");
        assert_eq!(session.refresh_token().await.unwrap().as_str(), "r1");
        assert_eq!(storage.get("access_token").await.unwrap().as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn replace_access_without_session_fails() {
        let session = SessionState::new(memory(), StorageKeys::default());
        assert!(session.replace_access("a2".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn terminate_clears_in_lockstep_and_notifies() {
        let storage = memory();
        let session = SessionState::new(storage.clone(), StorageKeys::default());
        session.establish(Credentials::new("a1", "r1")).await.unwrap();
        let mut status = session.subscribe();

        session.terminate().await;

        status.changed().await.unwrap();
        assert_eq!(*status.borrow(), AuthStatus::Unauthenticated);
        assert!(session.access_token().await.is_none());
        assert_eq!(storage.get("access_token").await.unwrap(), None);
        assert_eq!(storage.get("refresh_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn load_restores_complete_pair() {
        let storage = memory();
        let keys = StorageKeys::scoped("s1");
        storage.set(&keys.access, "a1").await.unwrap();
        storage.set(&keys.refresh, "r1").await.unwrap();

        let session = SessionState::load(storage, keys).await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.access_token().await.unwrap().as_str(), "a1");
    }

    #[tokio::test]
    async fn load_discards_half_pair() {
        let storage = memory();
        storage.set("access_token", "orphan").await.unwrap();

        let session = SessionState::load(storage.clone(), StorageKeys::default())
            .await
            .unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(storage.get("access_token").await.unwrap(), None);
    }
}
