//! Cache and CacheManager trait definitions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::CacheError;

/// A stored entry; `Null` is a cached absence, distinct from a miss
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Null,
    Bytes(Vec<u8>),
}

impl CacheValue {
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            CacheValue::Null => None,
            CacheValue::Bytes(bytes) => Some(bytes),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CacheValue::Null)
    }
}

impl From<Option<Vec<u8>>> for CacheValue {
    fn from(value: Option<Vec<u8>>) -> Self {
        value.map_or(CacheValue::Null, CacheValue::Bytes)
    }
}

/// A named cache.
///
/// All backends implement this trait to provide a unified interface.
#[async_trait]
pub trait Cache: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` on a miss
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Store a value, `None` stores a null entry
    async fn put(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), CacheError>;

    /// Remove one entry; returns whether it existed
    async fn evict(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every entry of this cache
    async fn clear(&self) -> Result<(), CacheError>;
}

/// Lookup of caches by name.
pub trait CacheManager: Send + Sync {
    fn get_cache(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError>;

    /// Names of the caches known so far
    fn cache_names(&self) -> Vec<String>;
}
