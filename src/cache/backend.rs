use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::cache::CacheError;

/// String key/value store with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Stores the value only if the key is absent; returns whether it was stored
    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_stale(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process cache used when no Redis URL is configured and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drops every expired entry, then stores the new one
fn insert_sweeping(entries: &mut HashMap<String, MemoryEntry>, key: &str, value: String, ttl: Duration) {
    entries.retain(|_, entry| !entry.is_stale());
    entries.insert(
        key.to_string(),
        MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        },
    );
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_stale() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Stale entry; double-check under the write lock before evicting
        let mut entries = self.entries.write().await;
        if entries.get(key).map(MemoryEntry::is_stale).unwrap_or(false) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        insert_sweeping(&mut entries, key, value, ttl);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(key) {
            if !existing.is_stale() {
                return Ok(false);
            }
        }
        insert_sweeping(&mut entries, key, value, ttl);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-backed cache shared between service instances
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis and keep a managed, reconnecting connection
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis cache");
        Ok(Self { connection })
    }
}

fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        let value = redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut connection)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds(ttl))
            .query_async::<_, ()>(&mut connection)
            .await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: String, ttl: Duration) -> Result<bool, CacheError> {
        let mut connection = self.connection.clone();
        let stored = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(expiry_seconds(ttl))
            .query_async::<_, Option<String>>(&mut connection)
            .await?;
        Ok(stored.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut connection)
            .await?;
        Ok(())
    }
}
