//! Key-value persistence
//!
//! Provides:
//! - The `KeyValueStore` contract used for EcoVerse state and quiz locks
//! - An in-memory store for development and tests
//! - A Redis-backed store with key prefixing and optional TTL
//! - Key builders

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// String key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a key, returning whether it existed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check connectivity
    async fn ping(&self) -> Result<()>;
}

/// Process-local store; contents are lost on restart
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Redis-backed store
pub struct RedisStore {
    connection: ConnectionManager,
    key_prefix: String,
    default_ttl_secs: u64,
}

impl RedisStore {
    /// Connect to Redis at `url`
    pub async fn connect(url: &str, config: &RedisConfig) -> Result<Self> {
        let client = Client::open(url).map_err(|e| AppError::CacheError {
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
            default_ttl_secs: config.default_ttl_secs,
        })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.key(key);
        let mut conn = self.connection.clone();

        let value: Option<String> = conn.get(&full_key).await?;
        debug!(key = %full_key, hit = value.is_some(), "Store get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let full_key = self.key(key);
        let mut conn = self.connection.clone();

        if self.default_ttl_secs > 0 {
            let _: () = conn.set_ex(&full_key, value, self.default_ttl_secs).await?;
        } else {
            let _: () = conn.set(&full_key, value).await?;
        }

        debug!(key = %full_key, "Store set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let full_key = self.key(key);
        let mut conn = self.connection.clone();

        let deleted: i32 = conn.del(&full_key).await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// Key builders
pub mod keys {
    use uuid::Uuid;

    /// Persisted EcoVerse game state of one user
    pub fn game_state(user_id: Uuid) -> String {
        format!("ecoverse:state:{}", user_id)
    }

    /// Issue record of one uploaded file
    pub fn storage_file(storage_id: Uuid) -> String {
        format!("storage:file:{}", storage_id)
    }

    /// Quiz unlock instants, keyed by email. Every viewer without an email
    /// shares the "anon" bucket.
    pub fn quiz_locks(email: Option<&str>) -> String {
        let owner = email.filter(|e| !e.is_empty()).unwrap_or("anon");
        format!("quizLocks:{}", owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        let user_id = uuid::Uuid::nil();
        assert_eq!(
            keys::game_state(user_id),
            "ecoverse:state:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(keys::quiz_locks(Some("a@b.c")), "quizLocks:a@b.c");
        assert_eq!(keys::quiz_locks(None), "quizLocks:anon");
        assert_eq!(keys::quiz_locks(Some("")), "quizLocks:anon");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1".to_string()).await.unwrap();
        store.set("k", "v2".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        store.ping().await.unwrap();
    }
}
