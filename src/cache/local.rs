//! In-process cache backed by `cached` stores.
//!
//! `SizedCache` gives least-recently-used eviction when `max_size` is set;
//! ttl and max-idle are checked per entry on read, and expired entries are
//! purged on every write.

use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use cached::{Cached, SizedCache, UnboundCache};

use crate::cache::{Cache, CacheError, CacheValue};
use crate::config::CachePolicy;

struct Entry {
    value: CacheValue,
    written: Instant,
    accessed: Instant,
}

enum Store {
    Sized(SizedCache<String, Entry>),
    Unbound(UnboundCache<String, Entry>),
}

impl Store {
    fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        match self {
            Store::Sized(store) => store.cache_get_mut(key),
            Store::Unbound(store) => store.cache_get_mut(key),
        }
    }

    fn set(&mut self, key: String, entry: Entry) {
        match self {
            Store::Sized(store) => {
                store.cache_set(key, entry);
            }
            Store::Unbound(store) => {
                store.cache_set(key, entry);
            }
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        match self {
            Store::Sized(store) => store.cache_remove(key).is_some(),
            Store::Unbound(store) => store.cache_remove(key).is_some(),
        }
    }

    fn clear(&mut self) {
        match self {
            Store::Sized(store) => store.cache_clear(),
            Store::Unbound(store) => store.cache_clear(),
        }
    }

    fn purge(&mut self, expired: impl Fn(&Entry) -> bool) {
        match self {
            Store::Sized(store) => store.retain(|_, entry| !expired(entry)),
            Store::Unbound(store) => {
                let stale: Vec<String> = store
                    .get_store()
                    .iter()
                    .filter(|(_, entry)| expired(entry))
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in stale {
                    store.cache_remove(&key);
                }
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Store::Sized(store) => store.cache_size(),
            Store::Unbound(store) => store.cache_size(),
        }
    }
}

/// Cache living in this process only
pub struct LocalCache {
    name: String,
    policy: CachePolicy,
    allow_null_values: bool,
    store: Mutex<Store>,
}

impl LocalCache {
    pub fn new(name: impl Into<String>, policy: CachePolicy, allow_null_values: bool) -> Self {
        let store = match policy.max_size() {
            Some(size) => Store::Sized(SizedCache::with_size(size as usize)),
            None => Store::Unbound(UnboundCache::new()),
        };
        Self {
            name: name.into(),
            policy,
            allow_null_values,
            store: Mutex::new(store),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Entries currently held, expired ones included until the next read or write
    pub fn len(&self) -> usize {
        self.store.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        let ttl_expired = self
            .policy
            .ttl()
            .is_some_and(|ttl| now.duration_since(entry.written) >= ttl);
        let idle_expired = self
            .policy
            .max_idle()
            .is_some_and(|idle| now.duration_since(entry.accessed) >= idle);
        ttl_expired || idle_expired
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Store>, CacheError> {
        self.store
            .lock()
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

#[async_trait]
impl Cache for LocalCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let now = Instant::now();
        let mut store = self.lock()?;
        let Some(entry) = store.get_mut(key) else {
            return Ok(None);
        };
        if !self.is_expired(entry, now) {
            entry.accessed = now;
            return Ok(Some(entry.value.clone()));
        }
        store.remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), CacheError> {
        if value.is_none() && !self.allow_null_values {
            return Err(CacheError::NullValueNotAllowed(self.name.clone()));
        }
        let now = Instant::now();
        let mut store = self.lock()?;
        if self.policy.ttl().is_some() || self.policy.max_idle().is_some() {
            store.purge(|entry| self.is_expired(entry, now));
        }
        store.set(
            key.to_string(),
            Entry {
                value: value.into(),
                written: now,
                accessed: now,
            },
        );
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.lock()?.remove(key))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_put_get_evict() {
        let cache = LocalCache::new("users", CachePolicy::unbounded(), true);
        cache.put("a", Some(b"1".to_vec())).await.unwrap();
        assert_eq!(
            cache.get("a").await.unwrap(),
            Some(CacheValue::Bytes(b"1".to_vec()))
        );
        assert!(cache.evict("a").await.unwrap());
        assert!(!cache.evict("a").await.unwrap());
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_null_values() {
        let cache = LocalCache::new("users", CachePolicy::unbounded(), true);
        cache.put("missing", None).await.unwrap();
        assert_eq!(cache.get("missing").await.unwrap(), Some(CacheValue::Null));

        let strict = LocalCache::new("strict", CachePolicy::unbounded(), false);
        assert!(matches!(
            strict.put("missing", None).await,
            Err(CacheError::NullValueNotAllowed(ref name)) if name == "strict"
        ));
    }

    #[tokio::test]
    async fn test_max_size_evicts_least_recently_used() {
        let cache = LocalCache::new("lru", CachePolicy::new(0, 0, 2), true);
        cache.put("a", Some(vec![1])).await.unwrap();
        cache.put("b", Some(vec![2])).await.unwrap();
        // touch a so b becomes the oldest
        cache.get("a").await.unwrap();
        cache.put("c", Some(vec![3])).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").await.unwrap().is_some());
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ttl_expires_entries() {
        let cache = LocalCache::new("ttl", CachePolicy::new(50, 0, 0), true);
        cache.put("a", Some(vec![1])).await.unwrap();
        assert!(cache.get("a").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_put_purges_expired_entries() {
        let cache = LocalCache::new("ttl", CachePolicy::new(50, 0, 0), true);
        for key in ["a", "b", "c"] {
            cache.put(key, Some(vec![1])).await.unwrap();
        }
        assert_eq!(cache.len(), 3);
        tokio::time::sleep(Duration::from_millis(120)).await;
        cache.put("d", Some(vec![2])).await.unwrap();
        assert_eq!(cache.len(), 1);

        let sized = LocalCache::new("sized", CachePolicy::new(0, 50, 10), true);
        sized.put("a", Some(vec![1])).await.unwrap();
        sized.put("b", Some(vec![1])).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        sized.put("c", Some(vec![2])).await.unwrap();
        assert_eq!(sized.len(), 1);
    }

    #[tokio::test]
    async fn test_max_idle_refreshed_by_reads() {
        let cache = LocalCache::new("idle", CachePolicy::new(0, 200, 0), true);
        cache.put("a", Some(vec![1])).await.unwrap();
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert!(cache.get("a").await.unwrap().is_some());
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = LocalCache::new("c", CachePolicy::unbounded(), true);
        cache.put("a", Some(vec![1])).await.unwrap();
        cache.put("b", None).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty());
    }
}
