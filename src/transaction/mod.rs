//! Transaction manager
//!
//! Registered only when `redis.transaction.enabled = true`.

mod error;
mod manager;

pub use error::TransactionError;
pub use manager::{RedisTransactionManager, Transaction};
