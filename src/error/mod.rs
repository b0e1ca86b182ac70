//! Top-level error type
//!
//! Each module owns its error enum; [`AutoconfigError`] wraps them for
//! callers driving the whole startup sequence.

use thiserror::Error;

use crate::cache::CacheError;
use crate::client::ClientError;
use crate::config::ConfigError;
use crate::logger::LoggerError;
use crate::transaction::TransactionError;

/// Errors surfaced by [`crate::autoconfigure::AutoConfiguration`] and the binary
#[derive(Error, Debug)]
pub enum AutoconfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Logger(#[from] LoggerError),

    /// A singleton name is already taken in the registry
    #[error("A singleton named '{0}' is already registered")]
    DuplicateSingleton(String),

    /// A built configuration could not be rendered
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The registry was closed and no longer accepts singletons
    #[error("Singleton registry is closed")]
    RegistryClosed,
}

pub type AutoconfigResult<T> = Result<T, AutoconfigError>;

impl AutoconfigError {
    /// True when the error came from the redis driver rather than from configuration
    pub fn is_connection_error(&self) -> bool {
        match self {
            AutoconfigError::Client(e) => e.is_connection_error(),
            AutoconfigError::Cache(CacheError::Connection(_)) => true,
            AutoconfigError::Transaction(TransactionError::Redis(_)) => true,
            AutoconfigError::Transaction(TransactionError::Client(e)) => e.is_connection_error(),
            _ => false,
        }
    }
}
