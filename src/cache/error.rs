//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::client::{ClientError, CodecError};

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Name has no entry in `redis.cache_manager.configs` and dynamic creation is off
    #[error("Cache '{0}' is not configured and dynamic cache creation is disabled")]
    MissingCacheConfig(String),

    #[error("Cache '{0}' does not accept null values")]
    NullValueNotAllowed(String),

    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// `redis.cache_manager.config_location` could not be read or parsed
    #[error("Failed to load cache configuration from {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },
}

impl From<ClientError> for CacheError {
    fn from(error: ClientError) -> Self {
        CacheError::Connection(error.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        CacheError::Operation(error.to_string())
    }
}

impl From<CodecError> for CacheError {
    fn from(error: CodecError) -> Self {
        CacheError::Serialization(error.to_string())
    }
}
