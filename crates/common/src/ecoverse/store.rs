//! Typed persistence of game state and quiz locks over a [`KeyValueStore`]

use super::quiz::QuizLocks;
use super::state::GameState;
use crate::cache::{keys, KeyValueStore};
use crate::errors::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct GameStore {
    kv: Arc<dyn KeyValueStore>,
}

impl GameStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load_state(&self, user_id: Uuid) -> Result<GameState> {
        self.load(&keys::game_state(user_id)).await
    }

    pub async fn save_state(&self, user_id: Uuid, state: &GameState) -> Result<()> {
        self.save(&keys::game_state(user_id), state).await
    }

    pub async fn load_locks(&self, email: Option<&str>) -> Result<QuizLocks> {
        self.load(&keys::quiz_locks(email)).await
    }

    pub async fn save_locks(&self, email: Option<&str>, locks: &QuizLocks) -> Result<()> {
        self.save(&keys::quiz_locks(email), locks).await
    }

    /// Missing or unreadable values load as the default
    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(T::default());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable stored value");
                self.kv.delete(key).await?;
                Ok(T::default())
            }
        }
    }

    async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_state_roundtrip_and_defaults() {
        let store = GameStore::new(Arc::new(MemoryStore::new()));
        let user_id = Uuid::now_v7();

        assert_eq!(store.load_state(user_id).await.unwrap(), GameState::default());

        let mut state = GameState::default();
        state.complete_action("quick", 5, 10);
        store.save_state(user_id, &state).await.unwrap();

        assert_eq!(store.load_state(user_id).await.unwrap(), state);
        assert_eq!(store.load_state(Uuid::now_v7()).await.unwrap(), GameState::default());
    }

    #[tokio::test]
    async fn test_corrupt_value_loads_default() {
        let kv = Arc::new(MemoryStore::new());
        kv.set("quizLocks:anon", "not json".to_string()).await.unwrap();

        let store = GameStore::new(kv.clone());
        assert_eq!(store.load_locks(None).await.unwrap(), QuizLocks::default());
        assert_eq!(kv.get("quizLocks:anon").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_locks_are_keyed_by_email() {
        let store = GameStore::new(Arc::new(MemoryStore::new()));
        let mut locks = QuizLocks::default();
        locks.lock("q1", Utc::now());

        store.save_locks(Some("a@example.com"), &locks).await.unwrap();

        assert!(store.load_locks(Some("a@example.com")).await.unwrap().is_locked("q1", Utc::now()));
        assert!(!store.load_locks(None).await.unwrap().is_locked("q1", Utc::now()));
    }
}
