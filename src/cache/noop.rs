//! NoOp cache implementation.
//!
//! Returned for unknown cache names when the fallback is enabled. Nothing is
//! stored, so every read is a miss.

use async_trait::async_trait;

use crate::cache::{Cache, CacheError, CacheValue};

/// A no-operation cache that doesn't store anything.
#[derive(Debug, Clone)]
pub struct NoOpCache {
    name: String,
}

impl NoOpCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Cache for NoOpCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, _key: &str) -> Result<Option<CacheValue>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: Option<Vec<u8>>) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_stores() {
        let cache = NoOpCache::new("users");
        cache.put("k", Some(b"v".to_vec())).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.evict("k").await.unwrap());
        assert_eq!(cache.name(), "users");
    }
}
