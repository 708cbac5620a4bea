use crate::errors::AppError;
use moka::future::Cache;
use moka::Expiry;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

/// A normalized upstream response and how long it stays fresh.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub data: Value,
    pub ttl: Duration,
}

/// Expires each entry after its own `ttl`, measured from the last write.
struct PerEntryTtl;

impl Expiry<String, CachedResponse> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedResponse,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache of normalized search responses.
///
/// Expired entries are dropped when looked up; there is no size bound, so a
/// stream of unique queries grows the cache until entries age out.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, CachedResponse>,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        let inner = Cache::builder().expire_after(PerEntryTtl).build();
        Self { inner, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn lookup(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await.map(|entry| entry.data)
    }

    pub async fn store(&self, key: String, data: Value, ttl: Duration) {
        self.inner.insert(key, CachedResponse { data, ttl }).await;
    }

    /// Stores with the cache's default TTL.
    pub async fn store_default(&self, key: String, data: Value) {
        self.store(key, data, self.default_ttl).await;
    }
}

/// Builds the cache key for a validated request on `path`.
///
/// The request is serialized in field-declaration order, so equal requests
/// always produce equal keys regardless of how the client ordered its JSON.
pub fn cache_key<T: Serialize>(path: &str, request: &T) -> Result<String, AppError> {
    let body = serde_json::to_string(request)?;
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    Ok(format!("{}:{}", path, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Query {
        name: &'static str,
        page: u32,
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let cache = ResponseCache::new(Duration::from_secs(120));
        cache.store_default("k".to_string(), json!({"a": 1})).await;

        assert_eq!(cache.lookup("k").await, Some(json!({"a": 1})));
        assert_eq!(cache.lookup("missing").await, None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(120));
        cache
            .store("k".to_string(), json!("v"), Duration::from_millis(100))
            .await;
        assert!(cache.lookup("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(cache.lookup("k").await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_is_last_writer_wins() {
        let cache = ResponseCache::new(Duration::from_secs(120));
        cache.store_default("k".to_string(), json!(1)).await;
        cache.store_default("k".to_string(), json!(2)).await;
        assert_eq!(cache.lookup("k").await, Some(json!(2)));
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key("/api/agents/search", &Query { name: "Jane", page: 1 }).unwrap();
        let b = cache_key("/api/agents/search", &Query { name: "Jane", page: 1 }).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("/api/agents/search:"));
    }

    #[test]
    fn test_cache_key_differs_by_path_and_body() {
        let base = cache_key("/api/agents/search", &Query { name: "Jane", page: 1 }).unwrap();
        let other_page = cache_key("/api/agents/search", &Query { name: "Jane", page: 2 }).unwrap();
        let other_path = cache_key("/api/landlords/search", &Query { name: "Jane", page: 1 }).unwrap();
        assert_ne!(base, other_page);
        assert_ne!(base, other_path);
    }
}
