//! Cache module providing named caches over the configured client.
//!
//! Backends:
//! - Redis (entries stored on the deployment the client points at)
//! - Local (in-process, per-entry ttl and idle checks)
//!
//! # Configuration
//!
//! ```toml
//! [redis.cache_manager]
//! backend = "redis"            # or "local"
//! dynamic = false              # unknown names fail unless true
//! fallback_to_no_op_cache = true
//! allow_null_values = true
//! config_location = "caches.yaml"   # optional, merged over the tables below
//!
//! [redis.cache_manager.configs.users]
//! ttl = 60000                  # ms, 0 = no expiry
//! max_idle = 0                 # ms, 0 = no idle expiry
//! max_size = 1000              # entries, 0 = unbounded
//! ```

mod composite;
mod error;
mod local;
mod manager;
mod noop;
mod redis;
mod traits;
mod typed;

pub use composite::CompositeCacheManager;
pub use error::CacheError;
pub use local::LocalCache;
pub use manager::{
    CacheManagerCustomizer, CacheProvider, LocalCacheProvider, RedisCacheManager,
    RedisCacheProvider, create_cache_manager, load_cache_configs,
};
pub use noop::NoOpCache;
pub use redis::RedisCache;
pub use traits::{Cache, CacheManager, CacheValue};
pub use typed::TypedCache;
