//! Named strategy registries
//!
//! Load balancers, codecs and address resolvers are selected by a string key
//! in configuration. A [`StrategyRegistry`] maps each key to a factory; every
//! lookup builds a fresh instance so two independently built configurations
//! never share mutable strategy state.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::client::ClientError;

/// A strategy instance selectable by name
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;
}

/// Strategy families with a built-in registry, used when a configuration
/// file is deserialized without a caller-supplied registry
pub trait DefaultRegistry: Strategy {
    fn default_registry() -> StrategyRegistry<Self>;
}

type Factory<T> = Arc<dyn Fn() -> Result<Arc<T>, ClientError> + Send + Sync>;

/// Keys compare case-insensitively with `_` and `-` interchangeable
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('_', "-")
}

/// Mapping from key to strategy factory
pub struct StrategyRegistry<T: ?Sized> {
    kind: &'static str,
    factories: BTreeMap<String, Factory<T>>,
}

impl<T: ?Sized> Clone for StrategyRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            factories: self.factories.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for StrategyRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kind", &self.kind)
            .field("keys", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: ?Sized + Strategy> StrategyRegistry<T> {
    /// Empty registry; `kind` names the family in error messages
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Register or replace the factory for `key`
    pub fn register<F>(&mut self, key: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Arc<T>, ClientError> + Send + Sync + 'static,
    {
        self.factories.insert(normalize_key(key), Arc::new(factory));
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with<F>(mut self, key: &str, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<T>, ClientError> + Send + Sync + 'static,
    {
        self.register(key, factory);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(&normalize_key(key))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build a new instance for `key`
    pub fn create(&self, key: &str) -> Result<StrategyRef<T>, ClientError> {
        let normalized = normalize_key(key);
        let factory = self
            .factories
            .get(&normalized)
            .ok_or_else(|| ClientError::UnknownStrategy {
                kind: self.kind,
                key: key.to_string(),
                available: self.keys().join(", "),
            })?;
        Ok(StrategyRef {
            key: normalized,
            instance: factory()?,
        })
    }
}

/// A resolved strategy together with the key it was created from
///
/// Serializes as its key. Equality compares keys, not instances.
pub struct StrategyRef<T: ?Sized> {
    key: String,
    instance: Arc<T>,
}

impl<T: ?Sized> StrategyRef<T> {
    pub fn new(key: &str, instance: Arc<T>) -> Self {
        Self {
            key: normalize_key(key),
            instance,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    /// Whether both refs point at the very same instance
    pub fn shares_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl<T: ?Sized> Clone for StrategyRef<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            instance: Arc::clone(&self.instance),
        }
    }
}

impl<T: ?Sized> Deref for StrategyRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T: ?Sized> PartialEq for StrategyRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: ?Sized> fmt::Debug for StrategyRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrategyRef({})", self.key)
    }
}

impl<T: ?Sized> Serialize for StrategyRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

impl<'de, T: ?Sized + DefaultRegistry> Deserialize<'de> for StrategyRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        T::default_registry()
            .create(&key)
            .map_err(serde::de::Error::custom)
    }
}
