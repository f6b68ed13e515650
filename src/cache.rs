use moka::sync::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide key/value cache with a fixed time-to-live.
///
/// Entries expire only by age; there is no capacity bound.
#[derive(Clone)]
pub struct TtlCache<V: Clone + Send + Sync + 'static> {
    inner: Cache<String, V>,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key)
    }

    pub fn set(&self, key: String, value: V) {
        self.inner.insert(key, value);
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

/// Whole-response cache for an endpoint.
///
/// Concurrent misses on one key share a single computation, and failed
/// computations are not stored.
#[derive(Clone)]
pub struct ResponseCache {
    inner: moka::future::Cache<String, Arc<str>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: moka::future::Cache::builder().time_to_live(ttl).build(),
        }
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub async fn get_or_try_insert<F, E>(&self, key: &str, init: F) -> Result<Arc<str>, Arc<E>>
    where
        F: Future<Output = Result<Arc<str>, E>>,
        E: Send + Sync + 'static,
    {
        self.inner.try_get_with(key.to_string(), init).await
    }
}
