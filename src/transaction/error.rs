//! Transaction error types

use thiserror::Error;

use crate::client::ClientError;
use crate::config::TopologyType;

#[derive(Error, Debug)]
pub enum TransactionError {
    /// MULTI/EXEC spanning slots is not available on a cluster
    #[error("Transactions are not supported for the {0} topology")]
    UnsupportedTopology(TopologyType),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Transaction failed: {0}")]
    Redis(#[from] redis::RedisError),
}
