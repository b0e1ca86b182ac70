//! Cache manager properties (`[redis.cache_manager]`)

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Where named caches keep their entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Entries live in Redis, reached through the registered client
    #[default]
    Redis,
    /// Entries live in process memory; no client connection is used
    Local,
}

/// Expiry and size policy of one named cache
///
/// All values use 0 for "unbounded".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Time to live after write, in milliseconds
    #[serde(default)]
    pub ttl: u64,

    /// Maximum idle time since last access, in milliseconds
    #[serde(default, alias = "max-idle")]
    pub max_idle: u64,

    /// Maximum number of entries, least recently used are evicted first
    #[serde(default, alias = "max-size")]
    pub max_size: u64,
}

impl CachePolicy {
    pub fn new(ttl: u64, max_idle: u64, max_size: u64) -> Self {
        Self {
            ttl,
            max_idle,
            max_size,
        }
    }

    /// Policy of a dynamically created cache
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl > 0).then(|| Duration::from_millis(self.ttl))
    }

    pub fn max_idle(&self) -> Option<Duration> {
        (self.max_idle > 0).then(|| Duration::from_millis(self.max_idle))
    }

    pub fn max_size(&self) -> Option<u64> {
        (self.max_size > 0).then_some(self.max_size)
    }

    pub fn is_unbounded(&self) -> bool {
        self.ttl == 0 && self.max_idle == 0 && self.max_size == 0
    }
}

/// Cache manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManagerProperties {
    /// Whether a cache manager is registered at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Named cache policies
    #[serde(default)]
    pub configs: BTreeMap<String, CachePolicy>,

    /// JSON or YAML file of named cache policies, read when the manager is
    /// created. Its entries replace same-named ones from `configs`.
    #[serde(default)]
    pub config_location: Option<PathBuf>,

    /// Create unbounded caches on demand for names missing from `configs`
    #[serde(default)]
    pub dynamic: bool,

    /// Serve a no-op cache for unknown names instead of failing
    #[serde(default = "default_true")]
    pub fallback_to_no_op_cache: bool,

    #[serde(default = "default_true")]
    pub allow_null_values: bool,

    /// Codec key for cached values; the client codec is used when unset
    #[serde(default)]
    pub codec: Option<String>,

    /// Prefix prepended to every Redis key written by the caches
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for CacheManagerProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            configs: BTreeMap::new(),
            config_location: None,
            dynamic: false,
            fallback_to_no_op_cache: true,
            allow_null_values: true,
            codec: None,
            key_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_manager_defaults() {
        let props = CacheManagerProperties::default();
        assert!(props.enabled);
        assert!(!props.dynamic);
        assert!(props.fallback_to_no_op_cache);
        assert!(props.allow_null_values);
        assert!(props.configs.is_empty());
        assert!(props.config_location.is_none());
        assert_eq!(props.backend, CacheBackend::Redis);
    }

    #[test]
    fn test_policy_zero_means_unbounded() {
        let policy = CachePolicy::unbounded();
        assert!(policy.is_unbounded());
        assert_eq!(policy.ttl(), None);
        assert_eq!(policy.max_idle(), None);
        assert_eq!(policy.max_size(), None);

        let policy = CachePolicy::new(60_000, 0, 100);
        assert_eq!(policy.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(policy.max_size(), Some(100));
        assert!(!policy.is_unbounded());
    }

    #[test]
    fn test_configs_deserialize_from_yaml() {
        let yaml = r#"
configs:
  users:
    ttl: 60000
    max_idle: 30000
  sessions:
    max_size: 1000
dynamic: true
"#;
        let props: CacheManagerProperties = serde_yaml::from_str(yaml).unwrap();
        assert!(props.dynamic);
        assert_eq!(props.configs["users"], CachePolicy::new(60_000, 30_000, 0));
        assert_eq!(props.configs["sessions"].max_size(), Some(1000));
        assert!(props.fallback_to_no_op_cache);
    }
}
