//! Configuration binding
//!
//! Layered loading of the `[redis]` and `[logger]` sections:
//! - `application.{toml,yaml,json}` in the configuration directory
//! - `application-{profile}.*` overlay for the active profile
//! - `APP_*` environment variable overrides
//!
//! Every field has a documented default, so an empty source set still binds.

pub mod cache_manager;
pub mod error;
pub mod loader;
pub mod redis;
pub mod settings;
pub mod validation;

pub use cache_manager::{CacheBackend, CacheManagerProperties, CachePolicy};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use redis::{
    BaseServerProperties, ClusterServersProperties, MasterSlaveBaseProperties,
    MasterSlaveServersProperties, ReadMode, RedisProperties, ReplicatedServersProperties,
    SentinelServersProperties, SingleServerProperties, SslProvider, SubscriptionMode,
    TopologyType, TransactionProperties, Transport,
};
pub use settings::{LoggerSettings, Settings};
