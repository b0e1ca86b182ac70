//! redis-autoconfigure
//!
//! Property-driven startup wiring for a Redis client and the components that
//! depend on it:
//!
//! - [`config`] binds the layered `[redis]` and `[logger]` sections
//! - [`client`] maps properties to a [`client::ClientConfig`] and owns the
//!   [`client::RedisClient`]
//! - [`cache`] named caches and their managers
//! - [`transaction`] MULTI/EXEC transactions
//! - [`autoconfigure`] decides what to build and registers it
//!
//! ```no_run
//! use redis_autoconfigure::autoconfigure::AutoConfiguration;
//! use redis_autoconfigure::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ConfigLoader::new().load()?;
//! let (registry, report) = AutoConfiguration::new(settings.redis).run()?;
//! println!("{report}");
//! let cache_manager = registry.cache_manager();
//! # drop(cache_manager);
//! # Ok(())
//! # }
//! ```

use shadow_rs::shadow;
shadow!(build);

pub mod autoconfigure;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod transaction;

pub use error::{AutoconfigError, AutoconfigResult};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
