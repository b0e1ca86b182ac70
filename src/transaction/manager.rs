//! MULTI/EXEC transactions on the master connection

use std::sync::Arc;

use redis::{Cmd, FromRedisValue, Pipeline};
use tracing::{debug, info};

use crate::client::RedisClient;
use crate::config::TopologyType;
use crate::transaction::TransactionError;

/// Starts transactions against the shared client
#[derive(Debug, Clone)]
pub struct RedisTransactionManager {
    client: Arc<RedisClient>,
}

impl RedisTransactionManager {
    /// Fails for a cluster client
    pub fn new(client: Arc<RedisClient>) -> Result<Self, TransactionError> {
        let topology = client.topology();
        if topology == TopologyType::Cluster {
            return Err(TransactionError::UnsupportedTopology(topology));
        }
        info!(topology = %topology, "Transaction manager created");
        Ok(Self { client })
    }

    pub fn client(&self) -> &Arc<RedisClient> {
        &self.client
    }

    pub fn begin(&self) -> Transaction {
        Transaction {
            client: Arc::clone(&self.client),
            pipeline: {
                let mut pipeline = redis::pipe();
                pipeline.atomic();
                pipeline
            },
            commands: 0,
        }
    }
}

/// Commands queued for one MULTI/EXEC block
///
/// Nothing is sent until [`commit`](Transaction::commit); dropping the
/// transaction or calling [`rollback`](Transaction::rollback) discards it.
pub struct Transaction {
    client: Arc<RedisClient>,
    pipeline: Pipeline,
    commands: usize,
}

impl Transaction {
    /// Queue a command
    pub fn add(&mut self, cmd: Cmd) -> &mut Self {
        self.pipeline.add_command(cmd);
        self.commands += 1;
        self
    }

    pub fn len(&self) -> usize {
        self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands == 0
    }

    /// Run the queued commands atomically, returning their replies
    pub async fn commit<T: FromRedisValue>(self) -> Result<T, TransactionError> {
        debug!(commands = self.commands, "Committing transaction");
        let mut conn = self.client.connection().await?;
        let result: T = self.pipeline.query_async(&mut conn).await?;
        Ok(result)
    }

    pub fn rollback(self) {
        debug!(commands = self.commands, "Transaction rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, build_client_config};
    use crate::config::RedisProperties;

    fn client(props: &RedisProperties) -> Arc<RedisClient> {
        Arc::new(RedisClient::new(build_client_config(props).unwrap()).unwrap())
    }

    #[test]
    fn test_cluster_rejects_transactions() {
        let mut props = RedisProperties::default();
        props.topology_type = "cluster".to_string();
        props.cluster.node_addresses = vec!["redis://127.0.0.1:7000".to_string()];
        let err = RedisTransactionManager::new(client(&props)).unwrap_err();
        assert!(matches!(
            err,
            TransactionError::UnsupportedTopology(TopologyType::Cluster)
        ));
        assert!(err.to_string().contains("cluster"));
    }

    #[test]
    fn test_begin_queues_commands() {
        let manager = RedisTransactionManager::new(client(&RedisProperties::default())).unwrap();
        let mut tx = manager.begin();
        assert!(tx.is_empty());
        tx.add(redis::cmd("SET").arg("a").arg(1).clone())
            .add(redis::cmd("INCR").arg("a").clone());
        assert_eq!(tx.len(), 2);
        tx.rollback();
    }

    #[tokio::test]
    async fn test_commit_on_closed_client() {
        let manager = RedisTransactionManager::new(client(&RedisProperties::default())).unwrap();
        manager.client().shutdown();
        let mut tx = manager.begin();
        tx.add(redis::cmd("PING").clone());
        let result: Result<(), _> = tx.commit().await;
        assert!(matches!(
            result,
            Err(TransactionError::Client(ClientError::Closed))
        ));
    }
}
