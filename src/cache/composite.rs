//! Composite manager with a no-op fallback.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::cache::noop::NoOpCache;
use crate::cache::{Cache, CacheError, CacheManager};

/// Asks each delegate in order; unknown names get a [`NoOpCache`] when the
/// fallback is on
pub struct CompositeCacheManager {
    managers: Vec<Arc<dyn CacheManager>>,
    fallback_to_no_op_cache: bool,
    fallbacks: DashMap<String, Arc<dyn Cache>>,
}

impl CompositeCacheManager {
    pub fn new(managers: Vec<Arc<dyn CacheManager>>, fallback_to_no_op_cache: bool) -> Self {
        Self {
            managers,
            fallback_to_no_op_cache,
            fallbacks: DashMap::new(),
        }
    }

    pub fn with_fallback(manager: Arc<dyn CacheManager>) -> Self {
        Self::new(vec![manager], true)
    }

    pub fn fallback_to_no_op_cache(&self) -> bool {
        self.fallback_to_no_op_cache
    }
}

impl CacheManager for CompositeCacheManager {
    fn get_cache(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        for manager in &self.managers {
            match manager.get_cache(name) {
                Ok(cache) => return Ok(cache),
                Err(CacheError::MissingCacheConfig(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if !self.fallback_to_no_op_cache {
            return Err(CacheError::MissingCacheConfig(name.to_string()));
        }
        let cache = self
            .fallbacks
            .entry(name.to_string())
            .or_insert_with(|| {
                warn!(cache = name, "No cache configured, caching disabled for this name");
                Arc::new(NoOpCache::new(name)) as Arc<dyn Cache>
            })
            .clone();
        Ok(cache)
    }

    /// Delegate names only; fallback caches are not listed
    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .managers
            .iter()
            .flat_map(|manager| manager.cache_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheManager, LocalCacheProvider, RedisCacheManager};
    use crate::client::codec::JsonCodec;
    use crate::client::StrategyRef;
    use crate::config::{CacheManagerProperties, CachePolicy};

    fn delegate() -> Arc<dyn CacheManager> {
        let mut properties = CacheManagerProperties::default();
        properties
            .configs
            .insert("users".to_string(), CachePolicy::unbounded());
        Arc::new(RedisCacheManager::new(
            Arc::new(LocalCacheProvider),
            properties,
            StrategyRef::new("json", Arc::new(JsonCodec)),
        ))
    }

    #[tokio::test]
    async fn test_unknown_name_falls_back_to_noop() {
        let composite = CompositeCacheManager::with_fallback(delegate());
        let cache = composite.get_cache("unknown").unwrap();
        cache.put("k", Some(vec![1])).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(Arc::ptr_eq(&cache, &composite.get_cache("unknown").unwrap()));
    }

    #[tokio::test]
    async fn test_known_name_uses_delegate() {
        let composite = CompositeCacheManager::with_fallback(delegate());
        let cache = composite.get_cache("users").unwrap();
        cache.put("k", Some(vec![1])).await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
        assert_eq!(composite.cache_names(), vec!["users"]);
    }

    #[test]
    fn test_without_fallback_unknown_is_error() {
        let composite = CompositeCacheManager::new(vec![delegate()], false);
        assert!(matches!(
            composite.get_cache("unknown"),
            Err(CacheError::MissingCacheConfig(_))
        ));
    }
}
