//! Ping command handler
//!
//! The only command that opens a connection.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::client::{ClientError, RedisClient, build_client_config};
use crate::config::settings::Settings;
use crate::error::AutoconfigResult;

/// Handler for the ping command
pub struct PingCommandHandler {
    config: Settings,
}

impl PingCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> AutoconfigResult<()> {
        let reply = self.ping().await?;
        println!("{reply}");
        Ok(())
    }

    /// PING bounded by the connect plus response timeout
    pub async fn ping(&self) -> AutoconfigResult<String> {
        let config = build_client_config(&self.config.redis)?;
        let connection = config.servers.connection();
        let limit: Duration = connection.connect_timeout() + connection.response_timeout();

        let client = RedisClient::new(config)?;
        info!(topology = %client.topology(), "Pinging Redis");

        let result = within(limit, client.ping()).await;
        client.shutdown();
        Ok(result?)
    }
}

async fn within<T>(
    limit: Duration,
    request: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::time::timeout(limit, request)
        .await
        .unwrap_or_else(|_| Err(ClientError::Timeout(limit)))
}
