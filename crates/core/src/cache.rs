//! CacheLayer (C11, §4.11)
//!
//! Grounded on the teacher's `SessionStore` trait abstraction
//! (`server/session.rs`): a small async trait with an in-memory default
//! implementation, so a distributed backend can be dropped in later
//! without touching callers. Per §4.11 this cache degrades to a
//! pass-through (always a miss, writes are no-ops) when no backing store
//! is configured, rather than failing the call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

/// Cache key is `(tenant_id, normalized_query)` hashed together, per
/// §4.9's Tier-3 short-circuit cache.
pub fn cache_key(tenant_id: &str, normalized_query: &str) -> String {
    format!("{tenant_id}:{normalized_query}")
}

#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: String, value: String, ttl: Duration);
    async fn len(&self) -> usize;
}

struct Entry {
    value: String,
    expires_at: Instant,
    inserted_at: Instant,
}

/// Bounded, TTL-evicting in-memory cache with FIFO eviction once the
/// capacity limit is reached (§4.9: "roughly 1000 entries, evicted FIFO").
pub struct InMemoryCache {
    capacity: usize,
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn evict_oldest(&self, entries: &mut HashMap<String, Entry>) {
        if let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, e)| e.inserted_at)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest_key);
        }
    }
}

#[async_trait]
impl CacheLayer for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            _ => None,
        }
    }

    async fn put(&self, key: String, value: String, ttl: Duration) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            self.evict_oldest(&mut entries);
        }
        let now = Instant::now();
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
                inserted_at: now,
            },
        );
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Degrades every lookup to a miss and every write to a no-op — used when
/// a tenant or deployment has no backing cache configured (§4.11).
#[derive(Default)]
pub struct NoopCache;

#[async_trait]
impl CacheLayer for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn put(&self, _key: String, _value: String, _ttl: Duration) {}

    async fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_retrieves_within_ttl() {
        let cache = InMemoryCache::new(10);
        cache.put("k".into(), "v".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryCache::new(10);
        cache.put("k".into(), "v".into(), Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn evicts_fifo_once_over_capacity() {
        let cache = InMemoryCache::new(2);
        cache.put("a".into(), "1".into(), Duration::from_secs(60)).await;
        cache.put("b".into(), "2".into(), Duration::from_secs(60)).await;
        cache.put("c".into(), "3".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("c").await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn noop_cache_never_hits() {
        let cache = NoopCache::default();
        cache.put("k".into(), "v".into(), Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 0);
    }
}
