//! Client error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while building a client configuration or using the client
#[derive(Error, Debug)]
pub enum ClientError {
    /// `redis.type` names no known topology
    #[error(
        "Unsupported topology type '{0}'. Valid values are: single, cluster, master_slave, sentinel, replicated, none"
    )]
    UnsupportedTopology(String),

    /// `redis.type = none`
    #[error("Redis autoconfiguration is disabled (redis.type = none)")]
    Disabled,

    /// A selected topology property violates its invariant
    #[error("Invalid property {key}: {message}")]
    InvalidProperty { key: String, message: String },

    /// No factory registered under the key
    #[error("Unknown {kind} '{key}'. Registered values are: {available}")]
    UnknownStrategy {
        kind: &'static str,
        key: String,
        available: String,
    },

    /// The factory exists but cannot build an instance from a key alone
    #[error("{kind} '{key}' cannot be created from configuration: {reason}")]
    UnsupportedStrategy {
        kind: &'static str,
        key: String,
        reason: String,
    },

    /// `redis.config.location` could not be read or parsed
    #[error("Failed to load client configuration from {}: {message}", path.display())]
    ConfigFile { path: PathBuf, message: String },

    /// Error reported by the redis driver, passed through unchanged
    #[error(transparent)]
    Connection(#[from] redis::RedisError),

    /// No pooled connection became available in time
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// A command got no reply within its time limit
    #[error("No reply within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Master discovery (sentinel or replicated) found no usable master
    #[error("No master found: {0}")]
    MasterNotFound(String),

    #[error("Client has been shut down")]
    Closed,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl ClientError {
    pub fn invalid_property(key: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::InvalidProperty {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from reaching the servers rather than from configuration
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_)
                | ClientError::Pool(_)
                | ClientError::Timeout(_)
                | ClientError::MasterNotFound(_)
        )
    }
}

impl From<bb8::RunError<redis::RedisError>> for ClientError {
    fn from(error: bb8::RunError<redis::RedisError>) -> Self {
        match error {
            bb8::RunError::User(e) => ClientError::Connection(e),
            bb8::RunError::TimedOut => {
                ClientError::Pool("timed out waiting for a connection".to_string())
            }
        }
    }
}
