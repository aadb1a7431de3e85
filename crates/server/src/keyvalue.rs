//! Key-value store for usage counters and last-seen times.
//!
//! Two backends: an in-process map, or Redis through a
//! [`ConnectionManager`] when several server processes share state.
//! Every operation is a single atomic step on either backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::config::{KeyValueSettings, KeyValueType};

#[derive(Debug, thiserror::Error)]
pub enum KvError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("value of {key} is not a number")]
    NotANumber { key: String },
}

pub type KvResult<T> = std::result::Result<T, KvError>;

#[derive(Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    /// Scored sets: member -> score.
    scored: HashMap<String, HashMap<String, i64>>,
}

#[derive(Clone)]
pub enum KeyValue {
    Memory(Arc<Mutex<MemoryStore>>),
    Redis(ConnectionManager),
}

impl KeyValue {
    pub fn memory() -> Self {
        Self::Memory(Arc::default())
    }

    pub async fn connect(settings: &KeyValueSettings) -> anyhow::Result<Self> {
        match settings.kind {
            KeyValueType::Memory => Ok(Self::memory()),
            KeyValueType::Redis => {
                let client = redis::Client::open(settings.redis_url.as_str())?;
                let manager = client.get_connection_manager().await?;
                tracing::info!(url = %settings.redis_url, "connected to redis");
                Ok(Self::Redis(manager))
            }
        }
    }

    fn store(store: &Mutex<MemoryStore>) -> MutexGuard<'_, MemoryStore> {
        store.lock().expect("key-value mutex poisoned")
    }

    pub async fn put(&self, key: &str, value: &str) -> KvResult<()> {
        match self {
            Self::Memory(store) => {
                Self::store(store).values.insert(key.to_string(), value.to_string());
                Ok(())
            }
            Self::Redis(conn) => Ok(conn.clone().set(key, value).await?),
        }
    }

    pub async fn get(&self, key: &str) -> KvResult<Option<String>> {
        match self {
            Self::Memory(store) => Ok(Self::store(store).values.get(key).cloned()),
            Self::Redis(conn) => Ok(conn.clone().get(key).await?),
        }
    }

    pub async fn del(&self, key: &str) -> KvResult<()> {
        match self {
            Self::Memory(store) => {
                let mut store = Self::store(store);
                store.values.remove(key);
                store.scored.remove(key);
                Ok(())
            }
            Self::Redis(conn) => Ok(conn.clone().del(key).await?),
        }
    }

    pub async fn incr_by(&self, key: &str, by: i64) -> KvResult<i64> {
        match self {
            Self::Memory(store) => Self::add_in_memory(&mut Self::store(store), key, by),
            Self::Redis(conn) => Ok(conn.clone().incr(key, by).await?),
        }
    }

    pub async fn decr_by(&self, key: &str, by: i64) -> KvResult<i64> {
        match self {
            Self::Memory(store) => Self::add_in_memory(&mut Self::store(store), key, -by),
            Self::Redis(conn) => Ok(conn.clone().decr(key, by).await?),
        }
    }

    fn add_in_memory(store: &mut MemoryStore, key: &str, by: i64) -> KvResult<i64> {
        let current = match store.values.get(key) {
            Some(v) => v.parse::<i64>().map_err(|_| KvError::NotANumber { key: key.to_string() })?,
            None => 0,
        };
        let next = current + by;
        store.values.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    /// A counter's value; missing keys count as zero.
    pub async fn get_count(&self, key: &str) -> KvResult<i64> {
        match self.get(key).await? {
            Some(v) => v.parse().map_err(|_| KvError::NotANumber { key: key.to_string() }),
            None => Ok(0),
        }
    }

    /// Set `member`'s score in the scored set at `key` (`ZADD`).
    pub async fn set_score(&self, key: &str, member: &str, score: i64) -> KvResult<()> {
        match self {
            Self::Memory(store) => {
                Self::store(store)
                    .scored
                    .entry(key.to_string())
                    .or_default()
                    .insert(member.to_string(), score);
                Ok(())
            }
            Self::Redis(conn) => {
                let _: i64 = conn.clone().zadd(key, member, score).await?;
                Ok(())
            }
        }
    }

    /// Drop members scored below `min` (`ZREMRANGEBYSCORE key -inf (min`).
    pub async fn remove_scores_below(&self, key: &str, min: i64) -> KvResult<()> {
        match self {
            Self::Memory(store) => {
                if let Some(set) = Self::store(store).scored.get_mut(key) {
                    set.retain(|_, score| *score >= min);
                }
                Ok(())
            }
            Self::Redis(conn) => {
                let _: i64 = conn.clone().zrembyscore(key, "-inf", format!("({min}")).await?;
                Ok(())
            }
        }
    }

    /// Members scored `min` or higher (`ZCOUNT key min +inf`).
    pub async fn count_scores_from(&self, key: &str, min: i64) -> KvResult<i64> {
        match self {
            Self::Memory(store) => Ok(Self::store(store)
                .scored
                .get(key)
                .map_or(0, |set| set.values().filter(|score| **score >= min).count() as i64)),
            Self::Redis(conn) => Ok(conn.clone().zcount(key, min, "+inf").await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend() {
        let kv = KeyValue::memory();
        assert_eq!(kv.get("missing").await.unwrap(), None);
        assert_eq!(kv.get_count("missing").await.unwrap(), 0);

        kv.put("greeting", "hello").await.unwrap();
        assert_eq!(kv.get("greeting").await.unwrap().as_deref(), Some("hello"));
        kv.del("greeting").await.unwrap();
        assert_eq!(kv.get("greeting").await.unwrap(), None);

        assert_eq!(kv.incr_by("count", 3).await.unwrap(), 3);
        assert_eq!(kv.decr_by("count", 1).await.unwrap(), 2);
        assert_eq!(kv.get_count("count").await.unwrap(), 2);

        assert_eq!(kv.decr_by("count", 5).await.unwrap(), -3);

        kv.put("word", "abc").await.unwrap();
        assert!(matches!(kv.incr_by("word", 1).await.unwrap_err(), KvError::NotANumber { .. }));
    }

    #[tokio::test]
    async fn scored_sets() {
        let kv = KeyValue::memory();
        assert_eq!(kv.count_scores_from("seen", 0).await.unwrap(), 0);

        kv.set_score("seen", "1", 10).await.unwrap();
        kv.set_score("seen", "2", 20).await.unwrap();
        kv.set_score("seen", "1", 30).await.unwrap();
        assert_eq!(kv.count_scores_from("seen", 0).await.unwrap(), 2);
        assert_eq!(kv.count_scores_from("seen", 25).await.unwrap(), 1);

        kv.remove_scores_below("seen", 25).await.unwrap();
        assert_eq!(kv.count_scores_from("seen", 0).await.unwrap(), 1);

        kv.del("seen").await.unwrap();
        assert_eq!(kv.count_scores_from("seen", 0).await.unwrap(), 0);
    }
}
