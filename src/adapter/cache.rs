//! In-memory TTL cache adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::StoreError;
use crate::port::outbound::MetricsCache;

struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Process-local stand-in for the external key-value cache.
#[derive(Default)]
pub struct InMemoryCache {
    entries: DashMap<(String, String), CacheEntry>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetricsCache for InMemoryCache {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let map_key = (namespace.to_string(), key.to_string());
        if let Some(entry) = self.entries.get(&map_key) {
            if entry.expires_at.map_or(true, |at| Instant::now() < at) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired entries are dropped lazily on read.
        self.entries
            .remove_if(&map_key, |_, entry| {
                entry.expires_at.map_or(false, |at| Instant::now() >= at)
            });
        Ok(None)
    }

    async fn set(
        &self,
        namespace: &str,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        self.entries.insert(
            (namespace.to_string(), key.to_string()),
            CacheEntry {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = InMemoryCache::new();
        cache
            .set("risk_metrics", "strat-1", json!({"score": 42}), None)
            .await
            .unwrap();

        let value = cache.get("risk_metrics", "strat-1").await.unwrap();
        assert_eq!(value, Some(json!({"score": 42})));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "key", json!(1), None)
            .await
            .unwrap();

        assert!(cache.get("b", "key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "key", json!(1), Some(Duration::from_millis(10)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("a", "key").await.unwrap().is_none());
    }
}
