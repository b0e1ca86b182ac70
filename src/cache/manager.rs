//! Cache manager that hands out named caches for the configured backend.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::cache::local::LocalCache;
use crate::cache::redis::RedisCache;
use crate::cache::typed::TypedCache;
use crate::cache::{Cache, CacheError, CacheManager};
use crate::client::{Codec, RedisClient, StrategyRef, StrategyRegistry};
use crate::config::{CacheBackend, CacheManagerProperties, CachePolicy};

/// Creates one cache of a backend
pub trait CacheProvider: Send + Sync {
    fn create(&self, name: &str, policy: &CachePolicy, allow_null_values: bool) -> Arc<dyn Cache>;
}

/// Caches stored on the Redis deployment
pub struct RedisCacheProvider {
    client: Arc<RedisClient>,
    key_prefix: Option<String>,
}

impl RedisCacheProvider {
    pub fn new(client: Arc<RedisClient>, key_prefix: Option<String>) -> Self {
        Self { client, key_prefix }
    }
}

impl CacheProvider for RedisCacheProvider {
    fn create(&self, name: &str, policy: &CachePolicy, allow_null_values: bool) -> Arc<dyn Cache> {
        Arc::new(RedisCache::new(
            Arc::clone(&self.client),
            name,
            *policy,
            allow_null_values,
            self.key_prefix.as_deref(),
        ))
    }
}

/// Caches held in process memory
#[derive(Debug, Default)]
pub struct LocalCacheProvider;

impl CacheProvider for LocalCacheProvider {
    fn create(&self, name: &str, policy: &CachePolicy, allow_null_values: bool) -> Arc<dyn Cache> {
        Arc::new(LocalCache::new(name, *policy, allow_null_values))
    }
}

/// Hook applied to the cache manager before it is registered
pub trait CacheManagerCustomizer: Send + Sync {
    fn customize(&self, manager: &mut RedisCacheManager) -> Result<(), CacheError>;
}

impl<F> CacheManagerCustomizer for F
where
    F: Fn(&mut RedisCacheManager) -> Result<(), CacheError> + Send + Sync,
{
    fn customize(&self, manager: &mut RedisCacheManager) -> Result<(), CacheError> {
        self(manager)
    }
}

/// Cache manager driven by `redis.cache_manager`
///
/// Configured caches are created up front. Other names are created on
/// demand, unbounded, only when `dynamic` is on.
pub struct RedisCacheManager {
    provider: Arc<dyn CacheProvider>,
    properties: CacheManagerProperties,
    codec: StrategyRef<dyn Codec>,
    caches: DashMap<String, Arc<dyn Cache>>,
}

impl RedisCacheManager {
    pub fn new(
        provider: Arc<dyn CacheProvider>,
        properties: CacheManagerProperties,
        codec: StrategyRef<dyn Codec>,
    ) -> Self {
        let caches = DashMap::new();
        for (name, policy) in &properties.configs {
            caches.insert(
                name.clone(),
                provider.create(name, policy, properties.allow_null_values),
            );
        }
        info!(
            caches = caches.len(),
            dynamic = properties.dynamic,
            codec = codec.key(),
            "Cache manager created"
        );
        Self {
            provider,
            properties,
            codec,
            caches,
        }
    }

    pub fn properties(&self) -> &CacheManagerProperties {
        &self.properties
    }

    pub fn codec(&self) -> &StrategyRef<dyn Codec> {
        &self.codec
    }

    pub fn set_codec(&mut self, codec: StrategyRef<dyn Codec>) {
        self.codec = codec;
    }

    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.properties.dynamic = dynamic;
    }

    pub fn set_allow_null_values(&mut self, allow_null_values: bool) {
        self.properties.allow_null_values = allow_null_values;
    }

    /// Create or replace a named cache
    ///
    /// Caches created before the call keep the null-value setting they
    /// were created with.
    pub fn configure_cache(&mut self, name: impl Into<String>, policy: CachePolicy) {
        let name = name.into();
        let cache = self
            .provider
            .create(&name, &policy, self.properties.allow_null_values);
        self.properties.configs.insert(name.clone(), policy);
        self.caches.insert(name, cache);
    }

    /// Named cache with the manager codec applied
    pub fn typed(&self, name: &str) -> Result<TypedCache, CacheError> {
        Ok(TypedCache::new(self.get_cache(name)?, self.codec.clone()))
    }
}

impl CacheManager for RedisCacheManager {
    fn get_cache(&self, name: &str) -> Result<Arc<dyn Cache>, CacheError> {
        if let Some(cache) = self.caches.get(name) {
            return Ok(Arc::clone(cache.value()));
        }
        if !self.properties.dynamic {
            return Err(CacheError::MissingCacheConfig(name.to_string()));
        }

        let cache = self
            .caches
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(cache = name, "Creating dynamic cache");
                self.provider.create(
                    name,
                    &CachePolicy::unbounded(),
                    self.properties.allow_null_values,
                )
            })
            .clone();
        Ok(cache)
    }

    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

/// Read named cache policies from a JSON or YAML file
///
/// `.json` is parsed as JSON, anything else as YAML.
pub fn load_cache_configs(path: &Path) -> Result<BTreeMap<String, CachePolicy>, CacheError> {
    let file_error = |message: String| CacheError::ConfigFile {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content).map_err(|e| file_error(e.to_string()))
    } else {
        serde_yaml::from_str(&content).map_err(|e| file_error(e.to_string()))
    }
}

/// Build the cache manager for `properties`
///
/// The codec is `properties.codec` when set, otherwise the client codec.
/// Policies from `properties.config_location` are merged over `configs`.
pub fn create_cache_manager(
    client: Arc<RedisClient>,
    properties: &CacheManagerProperties,
    codecs: &StrategyRegistry<dyn Codec>,
) -> Result<RedisCacheManager, CacheError> {
    let codec = match &properties.codec {
        Some(key) => codecs
            .create(key)
            .map_err(|e| CacheError::Serialization(e.to_string()))?,
        None => client.codec().clone(),
    };

    let mut properties = properties.clone();
    if let Some(location) = properties.config_location.clone() {
        let configs = load_cache_configs(&location)?;
        info!(location = %location.display(), caches = configs.len(), "Loaded cache configuration file");
        properties.configs.extend(configs);
    }

    let provider: Arc<dyn CacheProvider> = match properties.backend {
        CacheBackend::Redis => Arc::new(RedisCacheProvider::new(
            client,
            properties.key_prefix.clone(),
        )),
        CacheBackend::Local => Arc::new(LocalCacheProvider),
    };
    Ok(RedisCacheManager::new(provider, properties, codec))
}
