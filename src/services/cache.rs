use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key/value page cache with per-entry TTL.
///
/// Backed by Redis when one is configured, otherwise by an in-process map.
/// Cache failures never fail a request: a miss is reported instead.
#[derive(Clone)]
pub struct CacheService {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Redis(ConnectionManager),
    Memory(Arc<DashMap<String, MemoryEntry>>),
}

struct MemoryEntry {
    json: String,
    expires_at: Instant,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            backend: Backend::Redis(redis),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
        }
    }

    /// Entries held by the in-memory backend, expired ones included.
    /// Redis is not inspected.
    pub fn entry_count(&self) -> Option<usize> {
        match &self.backend {
            Backend::Redis(_) => None,
            Backend::Memory(map) => Some(map.len()),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                let result: Option<String> = conn.get(key).await.ok()?;
                result?
            }
            Backend::Memory(map) => {
                let entry = map.get(key)?;
                if entry.expires_at <= Instant::now() {
                    drop(entry);
                    map.remove(key);
                    return None;
                }
                entry.json.clone()
            }
        };
        serde_json::from_str(&json).ok()
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let Ok(json) = serde_json::to_string(value) else {
            return;
        };
        match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                if let Err(e) = conn.set_ex::<_, _, ()>(key, json, ttl_secs).await {
                    tracing::warn!("Cache write for '{}' failed: {}", key, e);
                }
            }
            Backend::Memory(map) => {
                let now = Instant::now();
                map.retain(|_, entry| entry.expires_at > now);
                map.insert(
                    key.to_string(),
                    MemoryEntry {
                        json,
                        expires_at: now + Duration::from_secs(ttl_secs),
                    },
                );
            }
        }
    }
}
