//! Redis client properties
//!
//! Bound from the `[redis]` section. Every topology group is always
//! default-initialized; only the group named by `redis.type` is read when the
//! client configuration is built.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::ClientError;
use crate::config::cache_manager::CacheManagerProperties;

// ============================================================================
// Default value functions
// ============================================================================

fn default_topology_type() -> String {
    "single".to_string()
}

fn default_codec() -> String {
    "json".to_string()
}

fn default_address_resolver() -> String {
    "default".to_string()
}

fn default_load_balancer() -> String {
    "round-robin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_lock_watchdog_timeout() -> u64 {
    30_000
}

fn default_idle_connection_timeout() -> u64 {
    10_000
}

fn default_ping_timeout() -> u64 {
    1_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_timeout() -> u64 {
    3_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_interval() -> u64 {
    1_500
}

fn default_reconnection_timeout() -> u64 {
    3_000
}

fn default_failed_attempts() -> u32 {
    3
}

fn default_subscriptions_per_connection() -> u32 {
    5
}

fn default_minimum_idle_size() -> u32 {
    10
}

fn default_pool_size() -> u32 {
    64
}

fn default_subscription_minimum_idle_size() -> u32 {
    1
}

fn default_subscription_pool_size() -> u32 {
    50
}

fn default_dns_monitoring_interval() -> u64 {
    5_000
}

fn default_scan_interval() -> u64 {
    1_000
}

fn default_single_address() -> String {
    "redis://127.0.0.1:6379".to_string()
}

/// Lowercase and unify `-`/`_` so `MASTER_SLAVE` and `master-slave` compare equal.
pub(crate) fn relaxed(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

// ============================================================================
// Enumerations
// ============================================================================

/// Deployment shape of the backing Redis installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyType {
    Single,
    Cluster,
    MasterSlave,
    Sentinel,
    Replicated,
}

impl TopologyType {
    /// Value of `redis.type` that switches the whole layer off
    pub const DISABLED: &'static str = "none";

    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyType::Single => "single",
            TopologyType::Cluster => "cluster",
            TopologyType::MasterSlave => "master_slave",
            TopologyType::Sentinel => "sentinel",
            TopologyType::Replicated => "replicated",
        }
    }

    /// Whether a raw discriminator value means "disabled"
    pub fn is_disabled(value: &str) -> bool {
        relaxed(value) == Self::DISABLED
    }
}

impl FromStr for TopologyType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match relaxed(s).as_str() {
            "" | "single" => Ok(TopologyType::Single),
            "cluster" => Ok(TopologyType::Cluster),
            "master_slave" => Ok(TopologyType::MasterSlave),
            "sentinel" => Ok(TopologyType::Sentinel),
            "replicated" => Ok(TopologyType::Replicated),
            _ => Err(ClientError::UnsupportedTopology(s.to_string())),
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which nodes serve read commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReadMode {
    #[default]
    Slave,
    Master,
    MasterSlave,
}

impl ReadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadMode::Slave => "slave",
            ReadMode::Master => "master",
            ReadMode::MasterSlave => "master_slave",
        }
    }
}

impl TryFrom<String> for ReadMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match relaxed(&value).as_str() {
            "slave" => Ok(ReadMode::Slave),
            "master" => Ok(ReadMode::Master),
            "master_slave" => Ok(ReadMode::MasterSlave),
            _ => Err(format!(
                "invalid read_mode '{}'. Valid values are: slave, master, master_slave",
                value
            )),
        }
    }
}

impl From<ReadMode> for String {
    fn from(mode: ReadMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Which nodes carry pub/sub subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SubscriptionMode {
    #[default]
    Slave,
    Master,
}

impl SubscriptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionMode::Slave => "slave",
            SubscriptionMode::Master => "master",
        }
    }
}

impl TryFrom<String> for SubscriptionMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match relaxed(&value).as_str() {
            "slave" => Ok(SubscriptionMode::Slave),
            "master" => Ok(SubscriptionMode::Master),
            _ => Err(format!(
                "invalid subscription_mode '{}'. Valid values are: slave, master",
                value
            )),
        }
    }
}

impl From<SubscriptionMode> for String {
    fn from(mode: SubscriptionMode) -> Self {
        mode.as_str().to_string()
    }
}

/// TLS implementation used for `rediss://` endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SslProvider {
    #[default]
    Rustls,
    Native,
}

impl SslProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslProvider::Rustls => "rustls",
            SslProvider::Native => "native",
        }
    }
}

impl TryFrom<String> for SslProvider {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match relaxed(&value).as_str() {
            "rustls" => Ok(SslProvider::Rustls),
            // `jdk` and `openssl` are accepted for files written for other clients
            "native" | "openssl" | "jdk" => Ok(SslProvider::Native),
            _ => Err(format!(
                "invalid ssl_provider '{}'. Valid values are: rustls, native",
                value
            )),
        }
    }
}

impl From<SslProvider> for String {
    fn from(provider: SslProvider) -> Self {
        provider.as_str().to_string()
    }
}

/// Event-loop transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transport {
    #[default]
    Tokio,
    NativeEpoll,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tokio => "tokio",
            Transport::NativeEpoll => "native_epoll",
        }
    }
}

impl TryFrom<String> for Transport {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match relaxed(&value).as_str() {
            "tokio" | "nio" => Ok(Transport::Tokio),
            "native_epoll" | "epoll" => Ok(Transport::NativeEpoll),
            _ => Err(format!(
                "invalid transport '{}'. Valid values are: tokio, native_epoll",
                value
            )),
        }
    }
}

impl From<Transport> for String {
    fn from(transport: Transport) -> Self {
        transport.as_str().to_string()
    }
}

// ============================================================================
// Connection settings shared by every topology
// ============================================================================

/// Connection timing, retry and TLS settings common to all topologies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseServerProperties {
    /// Idle connection timeout in milliseconds
    #[serde(default = "default_idle_connection_timeout")]
    pub idle_connection_timeout: u64,

    /// PING timeout in milliseconds
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Command response timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Attempts before a command is reported as failed
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay between command retries in milliseconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,

    /// Delay between reconnection attempts in milliseconds
    #[serde(default = "default_reconnection_timeout")]
    pub reconnection_timeout: u64,

    /// Consecutive failures before a node is marked down
    #[serde(default = "default_failed_attempts")]
    pub failed_attempts: u32,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Subscriptions multiplexed onto one connection
    #[serde(default = "default_subscriptions_per_connection")]
    pub subscriptions_per_connection: u32,

    /// Name sent with `CLIENT SETNAME`
    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default = "default_true")]
    pub ssl_enable_endpoint_identification: bool,

    #[serde(default)]
    pub ssl_provider: SslProvider,

    #[serde(default)]
    pub ssl_truststore: Option<PathBuf>,

    #[serde(default)]
    pub ssl_truststore_password: Option<String>,

    #[serde(default)]
    pub ssl_keystore: Option<PathBuf>,

    #[serde(default)]
    pub ssl_keystore_password: Option<String>,

    /// Interval between keep-alive PINGs in milliseconds, 0 disables them
    #[serde(default)]
    pub ping_connection_interval: u64,

    #[serde(default)]
    pub keep_alive: bool,

    #[serde(default)]
    pub tcp_no_delay: bool,
}

impl Default for BaseServerProperties {
    fn default() -> Self {
        Self {
            idle_connection_timeout: default_idle_connection_timeout(),
            ping_timeout: default_ping_timeout(),
            connect_timeout: default_connect_timeout(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_interval: default_retry_interval(),
            reconnection_timeout: default_reconnection_timeout(),
            failed_attempts: default_failed_attempts(),
            username: None,
            password: None,
            subscriptions_per_connection: default_subscriptions_per_connection(),
            client_name: None,
            ssl_enable_endpoint_identification: true,
            ssl_provider: SslProvider::default(),
            ssl_truststore: None,
            ssl_truststore_password: None,
            ssl_keystore: None,
            ssl_keystore_password: None,
            ping_connection_interval: 0,
            keep_alive: false,
            tcp_no_delay: false,
        }
    }
}

/// Pool and routing settings shared by the multi-node topologies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterSlaveBaseProperties {
    #[serde(flatten)]
    pub base: BaseServerProperties,

    /// Load balancer key, resolved when the client config is built
    #[serde(default = "default_load_balancer")]
    pub load_balancer: String,

    #[serde(default = "default_minimum_idle_size")]
    pub master_connection_minimum_idle_size: u32,

    #[serde(default = "default_pool_size")]
    pub master_connection_pool_size: u32,

    #[serde(default = "default_minimum_idle_size")]
    pub slave_connection_minimum_idle_size: u32,

    #[serde(default = "default_pool_size")]
    pub slave_connection_pool_size: u32,

    #[serde(default = "default_subscription_minimum_idle_size")]
    pub subscription_connection_minimum_idle_size: u32,

    #[serde(default = "default_subscription_pool_size")]
    pub subscription_connection_pool_size: u32,

    #[serde(default)]
    pub read_mode: ReadMode,

    #[serde(default)]
    pub subscription_mode: SubscriptionMode,

    /// DNS change monitoring interval in milliseconds
    #[serde(default = "default_dns_monitoring_interval")]
    pub dns_monitoring_interval: u64,
}

impl Default for MasterSlaveBaseProperties {
    fn default() -> Self {
        Self {
            base: BaseServerProperties::default(),
            load_balancer: default_load_balancer(),
            master_connection_minimum_idle_size: default_minimum_idle_size(),
            master_connection_pool_size: default_pool_size(),
            slave_connection_minimum_idle_size: default_minimum_idle_size(),
            slave_connection_pool_size: default_pool_size(),
            subscription_connection_minimum_idle_size: default_subscription_minimum_idle_size(),
            subscription_connection_pool_size: default_subscription_pool_size(),
            read_mode: ReadMode::default(),
            subscription_mode: SubscriptionMode::default(),
            dns_monitoring_interval: default_dns_monitoring_interval(),
        }
    }
}

// ============================================================================
// Topology groups
// ============================================================================

/// `redis.single`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleServerProperties {
    #[serde(flatten)]
    pub base: BaseServerProperties,

    /// Node address, `redis://host:port`
    #[serde(default = "default_single_address")]
    pub address: String,

    #[serde(default)]
    pub database: i64,

    #[serde(default = "default_minimum_idle_size")]
    pub connection_minimum_idle_size: u32,

    #[serde(default = "default_pool_size")]
    pub connection_pool_size: u32,

    #[serde(default = "default_subscription_minimum_idle_size")]
    pub subscription_connection_minimum_idle_size: u32,

    #[serde(default = "default_subscription_pool_size")]
    pub subscription_connection_pool_size: u32,

    #[serde(default = "default_true")]
    pub dns_monitoring: bool,

    #[serde(default = "default_dns_monitoring_interval")]
    pub dns_monitoring_interval: u64,
}

impl Default for SingleServerProperties {
    fn default() -> Self {
        Self {
            base: BaseServerProperties::default(),
            address: default_single_address(),
            database: 0,
            connection_minimum_idle_size: default_minimum_idle_size(),
            connection_pool_size: default_pool_size(),
            subscription_connection_minimum_idle_size: default_subscription_minimum_idle_size(),
            subscription_connection_pool_size: default_subscription_pool_size(),
            dns_monitoring: true,
            dns_monitoring_interval: default_dns_monitoring_interval(),
        }
    }
}

/// `redis.cluster`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterServersProperties {
    #[serde(flatten)]
    pub common: MasterSlaveBaseProperties,

    #[serde(default)]
    pub node_addresses: Vec<String>,

    /// Cluster topology scan interval in milliseconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for ClusterServersProperties {
    fn default() -> Self {
        Self {
            common: MasterSlaveBaseProperties::default(),
            node_addresses: Vec::new(),
            scan_interval: default_scan_interval(),
        }
    }
}

/// `redis.master_slave`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MasterSlaveServersProperties {
    #[serde(flatten)]
    pub common: MasterSlaveBaseProperties,

    #[serde(default)]
    pub master_address: Option<String>,

    #[serde(default)]
    pub slave_addresses: Vec<String>,

    #[serde(default)]
    pub database: i64,
}

/// `redis.sentinel`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentinelServersProperties {
    #[serde(flatten)]
    pub common: MasterSlaveBaseProperties,

    #[serde(default)]
    pub sentinel_addresses: Vec<String>,

    /// Name of the monitored master
    #[serde(default)]
    pub master_name: Option<String>,

    #[serde(default)]
    pub database: i64,
}

/// `redis.replicated`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedServersProperties {
    #[serde(flatten)]
    pub common: MasterSlaveBaseProperties,

    #[serde(default)]
    pub node_addresses: Vec<String>,

    /// Master change scan interval in milliseconds
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default)]
    pub database: i64,
}

impl Default for ReplicatedServersProperties {
    fn default() -> Self {
        Self {
            common: MasterSlaveBaseProperties::default(),
            node_addresses: Vec::new(),
            scan_interval: default_scan_interval(),
            database: 0,
        }
    }
}

// ============================================================================
// Auxiliary groups
// ============================================================================

/// `redis.config`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExternalConfigProperties {
    /// Complete client configuration file (JSON or YAML); wins over every
    /// individually bound client property when set
    #[serde(default)]
    pub location: Option<PathBuf>,
}

/// `redis.transaction`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionProperties {
    #[serde(default)]
    pub enabled: bool,
}

// ============================================================================
// Root
// ============================================================================

/// `[redis]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisProperties {
    /// Topology discriminator, kept raw so that unknown values are reported
    /// when the client config is built rather than at bind time
    #[serde(rename = "type", default = "default_topology_type")]
    pub topology_type: String,

    /// Worker threads, 0 means twice the number of cores
    #[serde(default)]
    pub threads: u32,

    /// Event-loop threads, 0 means twice the number of cores
    #[serde(default)]
    pub event_loop_threads: u32,

    /// Codec key
    #[serde(default = "default_codec")]
    pub codec: String,

    #[serde(default = "default_true")]
    pub reference_enabled: bool,

    /// Lock watchdog timeout in milliseconds
    #[serde(default = "default_lock_watchdog_timeout")]
    pub lock_watchdog_timeout: u64,

    #[serde(default = "default_true")]
    pub keep_pub_sub_order: bool,

    #[serde(default)]
    pub transport: Transport,

    /// Address resolver key
    #[serde(default = "default_address_resolver")]
    pub address_resolver: String,

    #[serde(default)]
    pub single: SingleServerProperties,

    #[serde(default)]
    pub cluster: ClusterServersProperties,

    #[serde(default)]
    pub master_slave: MasterSlaveServersProperties,

    #[serde(default)]
    pub sentinel: SentinelServersProperties,

    #[serde(default)]
    pub replicated: ReplicatedServersProperties,

    #[serde(default)]
    pub config: ExternalConfigProperties,

    #[serde(default)]
    pub cache_manager: CacheManagerProperties,

    #[serde(default)]
    pub transaction: TransactionProperties,
}

impl Default for RedisProperties {
    fn default() -> Self {
        Self {
            topology_type: default_topology_type(),
            threads: 0,
            event_loop_threads: 0,
            codec: default_codec(),
            reference_enabled: true,
            lock_watchdog_timeout: default_lock_watchdog_timeout(),
            keep_pub_sub_order: true,
            transport: Transport::default(),
            address_resolver: default_address_resolver(),
            single: SingleServerProperties::default(),
            cluster: ClusterServersProperties::default(),
            master_slave: MasterSlaveServersProperties::default(),
            sentinel: SentinelServersProperties::default(),
            replicated: ReplicatedServersProperties::default(),
            config: ExternalConfigProperties::default(),
            cache_manager: CacheManagerProperties::default(),
            transaction: TransactionProperties::default(),
        }
    }
}

impl RedisProperties {
    /// Whether `redis.type` switches the layer off
    pub fn is_disabled(&self) -> bool {
        TopologyType::is_disabled(&self.topology_type)
    }

    /// Parse the topology discriminator
    pub fn topology(&self) -> Result<TopologyType, ClientError> {
        self.topology_type.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_type_relaxed_parsing() {
        assert_eq!("single".parse::<TopologyType>().unwrap(), TopologyType::Single);
        assert_eq!("CLUSTER".parse::<TopologyType>().unwrap(), TopologyType::Cluster);
        assert_eq!(
            "master-slave".parse::<TopologyType>().unwrap(),
            TopologyType::MasterSlave
        );
        assert_eq!(
            "MASTER_SLAVE".parse::<TopologyType>().unwrap(),
            TopologyType::MasterSlave
        );
        assert_eq!("  ".parse::<TopologyType>().unwrap(), TopologyType::Single);
    }

    #[test]
    fn test_topology_type_unknown_names_value() {
        let err = "quorum".parse::<TopologyType>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedTopology(ref v) if v == "quorum"));
        assert!(err.to_string().contains("quorum"));
    }

    #[test]
    fn test_disabled_discriminator() {
        assert!(TopologyType::is_disabled("none"));
        assert!(TopologyType::is_disabled("NONE"));
        assert!(!TopologyType::is_disabled("single"));
    }

    #[test]
    fn test_single_defaults() {
        let single = SingleServerProperties::default();
        assert_eq!(single.address, "redis://127.0.0.1:6379");
        assert_eq!(single.database, 0);
        assert_eq!(single.connection_pool_size, 64);
        assert_eq!(single.connection_minimum_idle_size, 10);
        assert_eq!(single.base.timeout, 3_000);
        assert_eq!(single.base.connect_timeout, 10_000);
    }

    #[test]
    fn test_multi_node_defaults() {
        let cluster = ClusterServersProperties::default();
        assert!(cluster.node_addresses.is_empty());
        assert_eq!(cluster.scan_interval, 1_000);
        assert_eq!(cluster.common.load_balancer, "round-robin");
        assert_eq!(cluster.common.read_mode, ReadMode::Slave);
        assert_eq!(cluster.common.subscription_connection_pool_size, 50);
    }

    #[test]
    fn test_global_defaults() {
        let props = RedisProperties::default();
        assert_eq!(props.topology_type, "single");
        assert_eq!(props.codec, "json");
        assert_eq!(props.lock_watchdog_timeout, 30_000);
        assert!(props.keep_pub_sub_order);
        assert!(props.reference_enabled);
        assert!(props.config.location.is_none());
        assert!(!props.transaction.enabled);
    }

    #[test]
    fn test_read_mode_binding() {
        assert_eq!(ReadMode::try_from("MASTER-SLAVE".to_string()).unwrap(), ReadMode::MasterSlave);
        let err = ReadMode::try_from("nearest".to_string()).unwrap_err();
        assert!(err.contains("read_mode"));
        assert!(err.contains("nearest"));
    }

    #[test]
    fn test_flattened_base_deserializes_from_json() {
        let json = r#"{
            "address": "redis://10.0.0.1:6380",
            "timeout": 5000,
            "password": "secret"
        }"#;
        let single: SingleServerProperties = serde_json::from_str(json).unwrap();
        assert_eq!(single.address, "redis://10.0.0.1:6380");
        assert_eq!(single.base.timeout, 5000);
        assert_eq!(single.base.password.as_deref(), Some("secret"));
        assert_eq!(single.base.retry_attempts, 3);
    }
}
