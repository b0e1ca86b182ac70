//! Effective client configuration
//!
//! The value a [`crate::client::RedisClient`] is created from. It is either
//! mapped from [`crate::config::RedisProperties`] by the builder, or read
//! whole from the file named by `redis.config.location`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::client::balancer::{self, LoadBalancer, RoundRobinLoadBalancer};
use crate::client::codec::{self, Codec, JsonCodec};
use crate::client::registry::StrategyRef;
use crate::client::resolver::{self, AddressResolver, DefaultAddressResolver};
use crate::config::{ReadMode, SslProvider, SubscriptionMode, TopologyType, Transport};

// ============================================================================
// Endpoints
// ============================================================================

/// A parsed `redis://host:port` or `rediss://host:port` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub tls: bool,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse a node address, `key` names the property in the error
    pub fn parse(key: &str, address: &str) -> Result<Self, ClientError> {
        let invalid = |message: &str| {
            ClientError::invalid_property(key, format!("'{address}' {message}"))
        };

        let (scheme, rest) = address
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("must start with redis:// or rediss://"))?;
        let tls = match scheme.to_ascii_lowercase().as_str() {
            "redis" => false,
            "rediss" => true,
            _ => return Err(invalid("must start with redis:// or rediss://")),
        };

        let authority = rest.trim_end_matches('/');
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("must include a port"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("must include a host"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("has an invalid port"))?;

        Ok(Self {
            tls,
            host: host.to_string(),
            port,
        })
    }

    /// Connection URL understood by the redis driver
    pub fn url(&self, connection: &ConnectionConfig, database: i64) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let auth = match &connection.password {
            Some(password) => format!(
                "{}:{}@",
                urlencoding::encode(connection.username.as_deref().unwrap_or_default()),
                urlencoding::encode(password)
            ),
            None => String::new(),
        };
        let mut url = format!("{scheme}://{auth}{host}:{}/{database}", self.port);
        if self.tls && !connection.ssl.enable_endpoint_identification {
            url.push_str("#insecure");
        }
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "rediss" } else { "redis" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Shared settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub enable_endpoint_identification: bool,
    pub provider: SslProvider,
    pub truststore: Option<std::path::PathBuf>,
    pub truststore_password: Option<String>,
    pub keystore: Option<std::path::PathBuf>,
    pub keystore_password: Option<String>,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enable_endpoint_identification: true,
            provider: SslProvider::default(),
            truststore: None,
            truststore_password: None,
            keystore: None,
            keystore_password: None,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub idle_connection_timeout: u64,
    pub ping_timeout: u64,
    pub connect_timeout: u64,
    pub timeout: u64,
    pub retry_attempts: u32,
    pub retry_interval: u64,
    pub reconnection_timeout: u64,
    pub failed_attempts: u32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub subscriptions_per_connection: u32,
    pub client_name: Option<String>,
    pub ssl: SslConfig,
    pub ping_connection_interval: u64,
    pub keep_alive: bool,
    pub tcp_no_delay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            idle_connection_timeout: 10_000,
            ping_timeout: 1_000,
            connect_timeout: 10_000,
            timeout: 3_000,
            retry_attempts: 3,
            retry_interval: 1_500,
            reconnection_timeout: 3_000,
            failed_attempts: 3,
            username: None,
            password: None,
            subscriptions_per_connection: 5,
            client_name: None,
            ssl: SslConfig::default(),
            ping_connection_interval: 0,
            keep_alive: false,
            tcp_no_delay: false,
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// `None` when idle connections are never reaped
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_connection_timeout > 0).then(|| Duration::from_millis(self.idle_connection_timeout))
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval)
    }
}

fn default_load_balancer() -> StrategyRef<dyn LoadBalancer> {
    StrategyRef::new(balancer::ROUND_ROBIN, Arc::new(RoundRobinLoadBalancer::new()))
}

/// Pools and routing for topologies with replicas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePoolConfig {
    pub load_balancer: StrategyRef<dyn LoadBalancer>,
    pub master_connection_minimum_idle_size: u32,
    pub master_connection_pool_size: u32,
    pub slave_connection_minimum_idle_size: u32,
    pub slave_connection_pool_size: u32,
    pub subscription_connection_minimum_idle_size: u32,
    pub subscription_connection_pool_size: u32,
    pub read_mode: ReadMode,
    pub subscription_mode: SubscriptionMode,
    pub dns_monitoring_interval: u64,
}

impl Default for NodePoolConfig {
    fn default() -> Self {
        Self {
            load_balancer: default_load_balancer(),
            master_connection_minimum_idle_size: 10,
            master_connection_pool_size: 64,
            slave_connection_minimum_idle_size: 10,
            slave_connection_pool_size: 64,
            subscription_connection_minimum_idle_size: 1,
            subscription_connection_pool_size: 50,
            read_mode: ReadMode::default(),
            subscription_mode: SubscriptionMode::default(),
            dns_monitoring_interval: 5_000,
        }
    }
}

// ============================================================================
// Topologies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleServerConfig {
    pub connection: ConnectionConfig,
    pub address: String,
    pub database: i64,
    pub connection_minimum_idle_size: u32,
    pub connection_pool_size: u32,
    pub subscription_connection_minimum_idle_size: u32,
    pub subscription_connection_pool_size: u32,
    /// `None` when DNS monitoring is off
    pub dns_monitoring_interval: Option<u64>,
}

impl Default for SingleServerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            address: "redis://127.0.0.1:6379".to_string(),
            database: 0,
            connection_minimum_idle_size: 10,
            connection_pool_size: 64,
            subscription_connection_minimum_idle_size: 1,
            subscription_connection_pool_size: 50,
            dns_monitoring_interval: Some(5_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterServersConfig {
    pub connection: ConnectionConfig,
    pub pool: NodePoolConfig,
    pub node_addresses: Vec<String>,
    pub scan_interval: u64,
}

impl Default for ClusterServersConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            pool: NodePoolConfig::default(),
            node_addresses: Vec::new(),
            scan_interval: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSlaveServersConfig {
    pub connection: ConnectionConfig,
    pub pool: NodePoolConfig,
    pub master_address: String,
    pub slave_addresses: Vec<String>,
    pub database: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelServersConfig {
    pub connection: ConnectionConfig,
    pub pool: NodePoolConfig,
    pub master_name: String,
    pub sentinel_addresses: Vec<String>,
    pub database: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicatedServersConfig {
    pub connection: ConnectionConfig,
    pub pool: NodePoolConfig,
    pub node_addresses: Vec<String>,
    pub scan_interval: u64,
    pub database: i64,
}

impl Default for ReplicatedServersConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            pool: NodePoolConfig::default(),
            node_addresses: Vec::new(),
            scan_interval: 1_000,
            database: 0,
        }
    }
}

/// Exactly one topology per configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServersConfig {
    Single(SingleServerConfig),
    Cluster(ClusterServersConfig),
    MasterSlave(MasterSlaveServersConfig),
    Sentinel(SentinelServersConfig),
    Replicated(ReplicatedServersConfig),
}

impl Default for ServersConfig {
    fn default() -> Self {
        ServersConfig::Single(SingleServerConfig::default())
    }
}

impl ServersConfig {
    pub fn topology(&self) -> TopologyType {
        match self {
            ServersConfig::Single(_) => TopologyType::Single,
            ServersConfig::Cluster(_) => TopologyType::Cluster,
            ServersConfig::MasterSlave(_) => TopologyType::MasterSlave,
            ServersConfig::Sentinel(_) => TopologyType::Sentinel,
            ServersConfig::Replicated(_) => TopologyType::Replicated,
        }
    }

    pub fn connection(&self) -> &ConnectionConfig {
        match self {
            ServersConfig::Single(c) => &c.connection,
            ServersConfig::Cluster(c) => &c.connection,
            ServersConfig::MasterSlave(c) => &c.connection,
            ServersConfig::Sentinel(c) => &c.connection,
            ServersConfig::Replicated(c) => &c.connection,
        }
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionConfig {
        match self {
            ServersConfig::Single(c) => &mut c.connection,
            ServersConfig::Cluster(c) => &mut c.connection,
            ServersConfig::MasterSlave(c) => &mut c.connection,
            ServersConfig::Sentinel(c) => &mut c.connection,
            ServersConfig::Replicated(c) => &mut c.connection,
        }
    }

    /// Every configured node or sentinel address
    pub fn addresses(&self) -> Vec<&str> {
        match self {
            ServersConfig::Single(c) => vec![c.address.as_str()],
            ServersConfig::Cluster(c) => c.node_addresses.iter().map(String::as_str).collect(),
            ServersConfig::MasterSlave(c) => std::iter::once(c.master_address.as_str())
                .chain(c.slave_addresses.iter().map(String::as_str))
                .collect(),
            ServersConfig::Sentinel(c) => c.sentinel_addresses.iter().map(String::as_str).collect(),
            ServersConfig::Replicated(c) => c.node_addresses.iter().map(String::as_str).collect(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

fn default_codec() -> StrategyRef<dyn Codec> {
    StrategyRef::new(codec::JSON, Arc::new(JsonCodec))
}

fn default_address_resolver() -> StrategyRef<dyn AddressResolver> {
    StrategyRef::new(resolver::DEFAULT, Arc::new(DefaultAddressResolver))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub threads: u32,
    pub event_loop_threads: u32,
    pub codec: StrategyRef<dyn Codec>,
    pub reference_enabled: bool,
    pub lock_watchdog_timeout: u64,
    pub keep_pub_sub_order: bool,
    pub transport: Transport,
    pub address_resolver: StrategyRef<dyn AddressResolver>,
    /// Written as a one-key map (`servers: {cluster: {...}}`) in every format
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub servers: ServersConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            event_loop_threads: 0,
            codec: default_codec(),
            reference_enabled: true,
            lock_watchdog_timeout: 30_000,
            keep_pub_sub_order: true,
            transport: Transport::default(),
            address_resolver: default_address_resolver(),
            servers: ServersConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn topology(&self) -> TopologyType {
        self.servers.topology()
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Read a configuration file
    ///
    /// `.json` is parsed as JSON, `.yaml`/`.yml` as YAML; any other
    /// extension is tried as JSON first, then YAML.
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let file_error = |message: String| ClientError::ConfigFile {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::from_json(&content).map_err(|e| file_error(e.to_string())),
            Some("yaml" | "yml") => Self::from_yaml(&content).map_err(|e| file_error(e.to_string())),
            _ => Self::from_json(&content)
                .or_else(|_| Self::from_yaml(&content))
                .map_err(|e| file_error(e.to_string())),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
