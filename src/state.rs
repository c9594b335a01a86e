use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::repositories::token_storage::{MemoryStorage, RedisStorage, StorageKeys, TokenStorage};
use crate::services::api_client::ApiClient;
use crate::services::registry::SessionRegistry;
use crate::services::session::SessionState;

/// How often expired browser sessions are swept from the registry.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Upstream client; bound to a browser session per request.
    pub api: ApiClient,
    /// Browser sessions by cookie id.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let ttl_seconds = (config.session_duration_days.max(1) * 86400) as u64;
        let storage: Arc<dyn TokenStorage> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisStorage::connect(redis_url, ttl_seconds).await?),
            None => {
                tracing::info!("✅ Token storage kept in memory (REDIS_URL not set)");
                Arc::new(MemoryStorage::with_ttl(Duration::from_secs(ttl_seconds)))
            }
        };

        let state = Self::with_storage(config, storage)?;
        state.sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);
        tracing::info!("✅ Expired session sweep started (every {:?})", SESSION_SWEEP_INTERVAL);

        Ok(state)
    }

    /// Creates a new `AppState` on top of an existing token storage.
    pub fn with_storage(config: &Config, storage: Arc<dyn TokenStorage>) -> Result<Self> {
        let anonymous = Arc::new(SessionState::new(storage.clone(), StorageKeys::default()));
        let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout, anonymous)?;

        let sessions = SessionRegistry::new(storage, config.session_duration_days);
        tracing::info!("✅ Session registry initialized");

        Ok(AppState {
            config: config.clone(),
            api,
            sessions,
        })
    }
}
