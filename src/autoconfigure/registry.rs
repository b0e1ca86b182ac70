//! Named singleton registry
//!
//! Holds what the autoconfiguration produced, in registration order, and
//! owns the teardown: shutdown hooks run once, newest first, on
//! [`SingletonRegistry::close`] or drop.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::client::RedisClient;
use crate::error::AutoconfigError;
use crate::transaction::RedisTransactionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingletonKind {
    Client,
    CacheManager,
    TransactionManager,
}

impl SingletonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SingletonKind::Client => "client",
            SingletonKind::CacheManager => "cache manager",
            SingletonKind::TransactionManager => "transaction manager",
        }
    }
}

impl fmt::Display for SingletonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub enum Singleton {
    Client(Arc<RedisClient>),
    CacheManager(Arc<dyn CacheManager>),
    TransactionManager(Arc<RedisTransactionManager>),
}

impl Singleton {
    pub fn kind(&self) -> SingletonKind {
        match self {
            Singleton::Client(_) => SingletonKind::Client,
            Singleton::CacheManager(_) => SingletonKind::CacheManager,
            Singleton::TransactionManager(_) => SingletonKind::TransactionManager,
        }
    }
}

impl fmt::Debug for Singleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Singleton::Client(client) => f.debug_tuple("Client").field(client).finish(),
            Singleton::CacheManager(manager) => f
                .debug_tuple("CacheManager")
                .field(&manager.cache_names())
                .finish(),
            Singleton::TransactionManager(_) => f.write_str("TransactionManager"),
        }
    }
}

type ShutdownHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct SingletonRegistry {
    entries: Vec<(String, Singleton)>,
    primary_cache_manager: Option<String>,
    shutdown_hooks: Vec<(String, ShutdownHook)>,
    closed: bool,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when the name is taken or the registry is closed
    pub fn register(
        &mut self,
        name: impl Into<String>,
        singleton: Singleton,
    ) -> Result<(), AutoconfigError> {
        let name = name.into();
        if self.closed {
            return Err(AutoconfigError::RegistryClosed);
        }
        if self.contains(&name) {
            return Err(AutoconfigError::DuplicateSingleton(name));
        }
        info!(name = %name, kind = %singleton.kind(), "Registered singleton");
        self.entries.push((name, singleton));
        Ok(())
    }

    /// Register a client and the hook that shuts it down with the registry
    pub fn register_client(
        &mut self,
        name: impl Into<String>,
        client: Arc<RedisClient>,
    ) -> Result<(), AutoconfigError> {
        let name = name.into();
        self.register(name.clone(), Singleton::Client(Arc::clone(&client)))?;
        self.add_shutdown_hook(name, move || {
            client.shutdown();
        });
        Ok(())
    }

    pub fn add_shutdown_hook<F>(&mut self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shutdown_hooks.push((name.into(), Box::new(hook)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Singleton> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, singleton)| singleton)
    }

    /// Name of the first singleton of `kind`
    pub fn name_of(&self, kind: SingletonKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, singleton)| singleton.kind() == kind)
            .map(|(name, _)| name.as_str())
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn client(&self) -> Option<Arc<RedisClient>> {
        self.entries.iter().find_map(|(_, singleton)| match singleton {
            Singleton::Client(client) => Some(Arc::clone(client)),
            _ => None,
        })
    }

    /// Marks a registered cache manager as the one [`Self::cache_manager`] returns
    pub fn set_primary_cache_manager(&mut self, name: impl Into<String>) {
        self.primary_cache_manager = Some(name.into());
    }

    pub fn primary_cache_manager(&self) -> Option<&str> {
        self.primary_cache_manager.as_deref()
    }

    /// The primary cache manager, else the first one registered
    pub fn cache_manager(&self) -> Option<Arc<dyn CacheManager>> {
        let primary = self
            .primary_cache_manager
            .as_deref()
            .and_then(|name| self.get(name));
        let first = || {
            self.entries
                .iter()
                .map(|(_, singleton)| singleton)
                .find(|singleton| singleton.kind() == SingletonKind::CacheManager)
        };
        match primary.or_else(first) {
            Some(Singleton::CacheManager(manager)) => Some(Arc::clone(manager)),
            _ => None,
        }
    }

    pub fn transaction_manager(&self) -> Option<Arc<RedisTransactionManager>> {
        self.entries.iter().find_map(|(_, singleton)| match singleton {
            Singleton::TransactionManager(manager) => Some(Arc::clone(manager)),
            _ => None,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run shutdown hooks newest first; later calls do nothing
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        while let Some((name, hook)) = self.shutdown_hooks.pop() {
            debug!(name = %name, "Running shutdown hook");
            hook();
        }
        info!(singletons = self.entries.len(), "Singleton registry closed");
    }
}

impl fmt::Debug for SingletonRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonRegistry")
            .field("names", &self.names())
            .field("primary_cache_manager", &self.primary_cache_manager)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Drop for SingletonRegistry {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::cache::{CompositeCacheManager, LocalCacheProvider, RedisCacheManager};
    use crate::client::codec::JsonCodec;
    use crate::client::{ClientConfig, StrategyRef};
    use crate::config::CacheManagerProperties;

    fn client() -> Arc<RedisClient> {
        Arc::new(RedisClient::new(ClientConfig::default()).unwrap())
    }

    fn cache_manager() -> Arc<dyn CacheManager> {
        Arc::new(RedisCacheManager::new(
            Arc::new(LocalCacheProvider),
            CacheManagerProperties::default(),
            StrategyRef::new("json", Arc::new(JsonCodec)),
        ))
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = SingletonRegistry::new();
        registry.register_client("redis_client", client()).unwrap();
        let err = registry
            .register("redis_client", Singleton::CacheManager(cache_manager()))
            .unwrap_err();
        assert!(matches!(err, AutoconfigError::DuplicateSingleton(ref name) if name == "redis_client"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_by_kind() {
        let mut registry = SingletonRegistry::new();
        assert!(registry.client().is_none());
        assert!(registry.cache_manager().is_none());

        let client = client();
        registry.register_client("redis_client", Arc::clone(&client)).unwrap();
        registry
            .register("cache_manager", Singleton::CacheManager(cache_manager()))
            .unwrap();

        assert!(Arc::ptr_eq(&registry.client().unwrap(), &client));
        assert!(registry.cache_manager().is_some());
        assert!(registry.transaction_manager().is_none());
        assert_eq!(registry.name_of(SingletonKind::CacheManager), Some("cache_manager"));
        assert_eq!(registry.names(), vec!["redis_client", "cache_manager"]);
    }

    #[test]
    fn test_primary_cache_manager_wins() {
        let mut registry = SingletonRegistry::new();
        let first = cache_manager();
        let primary: Arc<dyn CacheManager> =
            Arc::new(CompositeCacheManager::with_fallback(cache_manager()));
        registry
            .register("local_cache_manager", Singleton::CacheManager(Arc::clone(&first)))
            .unwrap();
        registry
            .register("redis_cache_manager", Singleton::CacheManager(Arc::clone(&primary)))
            .unwrap();

        assert!(Arc::ptr_eq(&registry.cache_manager().unwrap(), &first));
        registry.set_primary_cache_manager("redis_cache_manager");
        assert!(Arc::ptr_eq(&registry.cache_manager().unwrap(), &primary));
    }

    #[test]
    fn test_client_shut_down_exactly_once() {
        let client = client();
        let mut registry = SingletonRegistry::new();
        registry.register_client("redis_client", Arc::clone(&client)).unwrap();
        assert!(!client.is_closed());

        registry.close();
        assert!(client.is_closed());
        assert!(registry.is_closed());
        // a second close does not run the hook again
        assert!(!client.shutdown());
        registry.close();
    }

    #[test]
    fn test_hooks_run_newest_first_on_drop() {
        let order = Arc::new(Mutex::new(Vec::new()));
        {
            let mut registry = SingletonRegistry::new();
            for name in ["first", "second", "third"] {
                let order = Arc::clone(&order);
                registry.add_shutdown_hook(name, move || order.lock().unwrap().push(name));
            }
        }
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_closed_registry_rejects_singletons() {
        let mut registry = SingletonRegistry::new();
        registry.close();
        assert!(matches!(
            registry.register_client("redis_client", client()),
            Err(AutoconfigError::RegistryClosed)
        ));
    }
}
