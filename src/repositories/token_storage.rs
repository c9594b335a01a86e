use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::Result;

/// Key/value storage for the bearer tokens of a session.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Tokens are lost on restart.
///
/// With a TTL, entries expire like their Redis counterparts: an expired
/// entry reads as absent and is dropped on the next write.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
    ttl: Option<Duration>,
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }
}

#[async_trait]
impl TokenStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: self.ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed storage, so sessions survive a restart of the dashboard.
#[derive(Clone)]
pub struct RedisStorage {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisStorage {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - The URL of the Redis server.
    /// * `ttl_seconds` - Expiry applied to every stored token.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `RedisStorage`.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        tracing::info!("✅ Redis Connection Manager initialized for token storage");
        Ok(Self { redis, ttl_seconds })
    }
}

#[async_trait]
impl TokenStorage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut redis = self.redis.clone();
        let value: Option<String> = redis.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.set_ex(key, value, self.ttl_seconds).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut redis = self.redis.clone();
        let _: () = redis.del(key).await?;
        Ok(())
    }
}

/// The two fixed names under which a session's tokens are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: "access_token".to_string(),
            refresh: "refresh_token".to_string(),
        }
    }
}

impl StorageKeys {
    /// Keys of one browser session: `session:{id}:access_token` and
    /// `session:{id}:refresh_token`.
    pub fn scoped(scope: impl std::fmt::Display) -> Self {
        let defaults = Self::default();
        Self {
            access: format!("session:{}:{}", scope, defaults.access),
            refresh: format!("session:{}:{}", scope, defaults.refresh),
        }
    }
}
