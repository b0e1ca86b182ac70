//! Serde-typed access to a cache through a codec.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{Cache, CacheError, CacheValue};
use crate::client::{Codec, StrategyRef};

/// A [`Cache`] paired with the codec used for its values
///
/// A value serializing to JSON `null` is stored as a null entry; a null entry
/// reads back as whatever `T` deserializes from `null` (e.g. `None`).
#[derive(Clone)]
pub struct TypedCache {
    cache: Arc<dyn Cache>,
    codec: StrategyRef<dyn Codec>,
}

impl TypedCache {
    pub fn new(cache: Arc<dyn Cache>, codec: StrategyRef<dyn Codec>) -> Self {
        Self { cache, codec }
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    pub fn inner(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let value = match self.cache.get(key).await? {
            None => return Ok(None),
            Some(CacheValue::Null) => Value::Null,
            Some(CacheValue::Bytes(bytes)) => self.codec.decode(&bytes)?,
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let value =
            serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let bytes = match value {
            Value::Null => None,
            other => Some(self.codec.encode(&other)?),
        };
        self.cache.put(key, bytes).await
    }

    pub async fn evict(&self, key: &str) -> Result<bool, CacheError> {
        self.cache.evict(key).await
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        self.cache.clear().await
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::cache::LocalCache;
    use crate::client::codec::{JsonCodec, MsgPackCodec};
    use crate::config::CachePolicy;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    fn typed(codec: StrategyRef<dyn Codec>) -> TypedCache {
        TypedCache::new(
            Arc::new(LocalCache::new("users", CachePolicy::unbounded(), true)),
            codec,
        )
    }

    #[tokio::test]
    async fn test_struct_through_each_codec() {
        let user = User {
            id: 7,
            name: "ada".to_string(),
        };
        for codec in [
            StrategyRef::new("json", Arc::new(JsonCodec) as Arc<dyn Codec>),
            StrategyRef::new("msgpack", Arc::new(MsgPackCodec) as Arc<dyn Codec>),
        ] {
            let cache = typed(codec);
            cache.put("7", &user).await.unwrap();
            assert_eq!(cache.get::<User>("7").await.unwrap(), Some(user.clone()));
        }
    }

    #[tokio::test]
    async fn test_none_is_stored_as_null_entry() {
        let cache = typed(StrategyRef::new("json", Arc::new(JsonCodec)));
        cache.put("missing", &None::<User>).await.unwrap();
        assert_eq!(
            cache.inner().get("missing").await.unwrap(),
            Some(CacheValue::Null)
        );
        assert_eq!(cache.get::<Option<User>>("missing").await.unwrap(), Some(None));
        assert_eq!(cache.get::<Option<User>>("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_serialization_error() {
        let cache = typed(StrategyRef::new("json", Arc::new(JsonCodec)));
        cache.put("k", "text").await.unwrap();
        assert!(matches!(
            cache.get::<User>("k").await,
            Err(CacheError::Serialization(_))
        ));
    }
}
