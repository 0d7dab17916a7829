//! Secret cache for reducing backend calls.
//!
//! Provides an in-memory TTL cache for fetched secrets keyed by
//! `backend:name:version` so repeated lookups avoid calling external
//! backends.

use crate::backends::DEFAULT_VERSION;
use crate::types::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cached secret entry with its insertion instant.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: SecretString,
    cached_at: Instant,
}

/// TTL-aware cache for resolved secret values.
///
/// Keys combine backend name, secret name, and version. An omitted version
/// normalizes to `"latest"`, so callers omitting the version and callers
/// passing `"latest"` explicitly hit the same entry.
///
/// When no TTL is configured entries never expire for the life of the cache.
/// Expired entries are removed lazily by the read that discovers the expiry;
/// there is no background sweep.
#[derive(Debug)]
pub struct SecretCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Option<Duration>,
}

/// Build the composite cache key `backend:name:version`.
fn cache_key(backend: &str, name: &str, version: Option<&str>) -> String {
    format!("{}:{}:{}", backend, name, version.unwrap_or(DEFAULT_VERSION))
}

impl SecretCache {
    /// Create a new cache. `None` TTL means entries never expire.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// Store a value, overwriting any existing entry for the same key.
    pub async fn set(&self, backend: &str, name: &str, value: &str, version: Option<&str>) {
        let key = cache_key(backend, name, version);
        debug!(key = %key, "Caching secret");
        self.entries
            .write()
            .await
            .insert(key, CacheEntry { value: SecretString::new(value), cached_at: Instant::now() });
    }

    /// Get a cached value unless it is missing or TTL-expired.
    ///
    /// An expired entry is removed as a side effect of this read.
    pub async fn get(&self, backend: &str, name: &str, version: Option<&str>) -> Option<String> {
        let key = cache_key(backend, name, version);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                None => return None,
                Some(entry) if !self.is_expired(entry) => {
                    debug!(key = %key, "Cache hit for secret");
                    return Some(entry.value.expose_secret().to_string());
                }
                Some(_) => {}
            }
        }

        // Expired: evict under the write lock, re-checking in case the entry
        // was overwritten between the two lock holds.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key) {
            if !self.is_expired(entry) {
                return Some(entry.value.expose_secret().to_string());
            }
            debug!(key = %key, "Removing expired cache entry");
            entries.remove(&key);
        }
        None
    }

    /// Whether a live (unexpired) entry exists for this key.
    pub async fn has(&self, backend: &str, name: &str, version: Option<&str>) -> bool {
        self.get(backend, name, version).await.is_some()
    }

    /// Remove an entry. Returns true iff an entry existed and was removed.
    pub async fn delete(&self, backend: &str, name: &str, version: Option<&str>) -> bool {
        let key = cache_key(backend, name, version);
        let removed = self.entries.write().await.remove(&key).is_some();
        if removed {
            debug!(key = %key, "Invalidated cached secret");
        }
        removed
    }

    /// Remove all entries.
    pub async fn clear(&self) {
        debug!("Clearing entire secret cache");
        self.entries.write().await.clear();
    }

    /// Count of currently stored (not necessarily unexpired) entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The TTL for this cache, if one is configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        match self.ttl {
            Some(ttl) => entry.cached_at.elapsed() > ttl,
            None => false,
        }
    }
}

impl Clone for SecretCache {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), ttl: self.ttl }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_and_get() {
        let cache = SecretCache::new(Some(Duration::from_secs(60)));
        cache.set("memory", "api_key", "value-1", None).await;

        assert_eq!(cache.get("memory", "api_key", None).await.as_deref(), Some("value-1"));
        assert!(cache.has("memory", "api_key", None).await);
    }

    #[tokio::test]
    async fn test_omitted_and_explicit_latest_share_an_entry() {
        let cache = SecretCache::new(None);
        cache.set("memory", "api_key", "value-1", None).await;

        assert_eq!(
            cache.get("memory", "api_key", Some("latest")).await.as_deref(),
            Some("value-1")
        );
        assert_eq!(cache.len().await, 1);

        // Overwriting via the explicit form hits the same entry.
        cache.set("memory", "api_key", "value-2", Some("latest")).await;
        assert_eq!(cache.get("memory", "api_key", None).await.as_deref(), Some("value-2"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_expiration_and_lazy_eviction() {
        let cache = SecretCache::new(Some(Duration::from_millis(50)));
        cache.set("memory", "api_key", "value", None).await;

        assert!(cache.get("memory", "api_key", None).await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        // Still stored until a read discovers the expiry.
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("memory", "api_key", None).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let cache = SecretCache::new(None);
        cache.set("memory", "api_key", "value", None).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get("memory", "api_key", None).await.is_some());
    }

    #[tokio::test]
    async fn test_cache_delete() {
        let cache = SecretCache::new(None);
        cache.set("memory", "api_key", "value", None).await;

        assert!(cache.delete("memory", "api_key", None).await);
        assert!(!cache.delete("memory", "api_key", None).await);
        assert!(cache.get("memory", "api_key", None).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_clear() {
        let cache = SecretCache::new(None);
        cache.set("memory", "secret1", "a", None).await;
        cache.set("memory", "secret2", "b", None).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(cache.get("memory", "secret1", None).await.is_none());
        assert!(cache.get("memory", "secret2", None).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_key_uniqueness() {
        let cache = SecretCache::new(None);
        cache.set("memory", "secret", "a", None).await;
        cache.set("gcp", "secret", "b", None).await;
        cache.set("memory", "secret", "c", Some("3")).await;

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.get("memory", "secret", None).await.as_deref(), Some("a"));
        assert_eq!(cache.get("gcp", "secret", None).await.as_deref(), Some("b"));
        assert_eq!(cache.get("memory", "secret", Some("3")).await.as_deref(), Some("c"));
    }
}
