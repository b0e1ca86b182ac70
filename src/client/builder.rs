//! Property to client-configuration mapping
//!
//! [`ClientConfigBuilder::build`] is the single entry point: when
//! `redis.config.location` is set the file is used as-is, otherwise the
//! group named by `redis.type` is validated and copied field by field.
//! Registered customizers run last, in registration order.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::ClientError;
use crate::client::balancer::LoadBalancer;
use crate::client::codec::Codec;
use crate::client::config::{
    ClientConfig, ClusterServersConfig, ConnectionConfig, Endpoint, MasterSlaveServersConfig,
    NodePoolConfig, ReplicatedServersConfig, SentinelServersConfig, ServersConfig,
    SingleServerConfig, SslConfig,
};
use crate::client::registry::{DefaultRegistry, StrategyRegistry};
use crate::client::resolver::AddressResolver;
use crate::config::{BaseServerProperties, MasterSlaveBaseProperties, RedisProperties, TopologyType};

/// Hook applied to every built [`ClientConfig`]
pub trait ClientConfigCustomizer: Send + Sync {
    fn customize(&self, config: &mut ClientConfig) -> Result<(), ClientError>;
}

impl<F> ClientConfigCustomizer for F
where
    F: Fn(&mut ClientConfig) -> Result<(), ClientError> + Send + Sync,
{
    fn customize(&self, config: &mut ClientConfig) -> Result<(), ClientError> {
        self(config)
    }
}

/// Builds a [`ClientConfig`] against a set of strategy registries
#[derive(Clone)]
pub struct ClientConfigBuilder {
    load_balancers: StrategyRegistry<dyn LoadBalancer>,
    codecs: StrategyRegistry<dyn Codec>,
    address_resolvers: StrategyRegistry<dyn AddressResolver>,
    customizers: Vec<Arc<dyn ClientConfigCustomizer>>,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            load_balancers: <dyn LoadBalancer>::default_registry(),
            codecs: <dyn Codec>::default_registry(),
            address_resolvers: <dyn AddressResolver>::default_registry(),
            customizers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("load_balancers", &self.load_balancers)
            .field("codecs", &self.codecs)
            .field("address_resolvers", &self.address_resolvers)
            .field("customizers", &self.customizers.len())
            .finish()
    }
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_balancers_mut(&mut self) -> &mut StrategyRegistry<dyn LoadBalancer> {
        &mut self.load_balancers
    }

    pub fn codecs(&self) -> &StrategyRegistry<dyn Codec> {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut StrategyRegistry<dyn Codec> {
        &mut self.codecs
    }

    pub fn address_resolvers_mut(&mut self) -> &mut StrategyRegistry<dyn AddressResolver> {
        &mut self.address_resolvers
    }

    pub fn with_customizer<C>(mut self, customizer: C) -> Self
    where
        C: ClientConfigCustomizer + 'static,
    {
        self.customizers.push(Arc::new(customizer));
        self
    }

    pub fn add_customizer(&mut self, customizer: Arc<dyn ClientConfigCustomizer>) {
        self.customizers.push(customizer);
    }

    /// Build the effective configuration
    pub fn build(&self, props: &RedisProperties) -> Result<ClientConfig, ClientError> {
        let mut config = match &props.config.location {
            Some(location) => {
                info!(location = %location.display(), "Loading client configuration from file");
                ClientConfig::from_path(location)?
            }
            None => self.map_properties(props)?,
        };

        for customizer in &self.customizers {
            customizer.customize(&mut config)?;
        }
        Ok(config)
    }

    fn map_properties(&self, props: &RedisProperties) -> Result<ClientConfig, ClientError> {
        if props.is_disabled() {
            return Err(ClientError::Disabled);
        }
        let topology = props.topology()?;
        debug!(topology = %topology, "Mapping client properties");

        let servers = match topology {
            TopologyType::Single => self.map_single(props)?,
            TopologyType::Cluster => self.map_cluster(props)?,
            TopologyType::MasterSlave => self.map_master_slave(props)?,
            TopologyType::Sentinel => self.map_sentinel(props)?,
            TopologyType::Replicated => self.map_replicated(props)?,
        };

        Ok(ClientConfig {
            threads: props.threads,
            event_loop_threads: props.event_loop_threads,
            codec: self.codecs.create(&props.codec)?,
            reference_enabled: props.reference_enabled,
            lock_watchdog_timeout: props.lock_watchdog_timeout,
            keep_pub_sub_order: props.keep_pub_sub_order,
            transport: props.transport,
            address_resolver: self.address_resolvers.create(&props.address_resolver)?,
            servers,
        })
    }

    fn map_single(&self, props: &RedisProperties) -> Result<ServersConfig, ClientError> {
        let single = &props.single;
        let connection = map_connection(&single.base);
        let address = require_address("redis.single.address", Some(&single.address))?;

        Ok(ServersConfig::Single(SingleServerConfig {
            connection,
            address,
            database: require_database("redis.single.database", single.database)?,
            connection_minimum_idle_size: single.connection_minimum_idle_size,
            connection_pool_size: single.connection_pool_size,
            subscription_connection_minimum_idle_size: single
                .subscription_connection_minimum_idle_size,
            subscription_connection_pool_size: single.subscription_connection_pool_size,
            dns_monitoring_interval: single
                .dns_monitoring
                .then_some(single.dns_monitoring_interval),
        }))
    }

    fn map_cluster(&self, props: &RedisProperties) -> Result<ServersConfig, ClientError> {
        let cluster = &props.cluster;
        let connection = map_connection(&cluster.common.base);
        let pool = self.map_pool("redis.cluster", &cluster.common)?;

        Ok(ServersConfig::Cluster(ClusterServersConfig {
            connection,
            pool,
            node_addresses: require_addresses(
                "redis.cluster.node_addresses",
                &cluster.node_addresses,
            )?,
            scan_interval: cluster.scan_interval,
        }))
    }

    fn map_master_slave(&self, props: &RedisProperties) -> Result<ServersConfig, ClientError> {
        let master_slave = &props.master_slave;
        let connection = map_connection(&master_slave.common.base);
        let pool = self.map_pool("redis.master_slave", &master_slave.common)?;
        let master_address = require_address(
            "redis.master_slave.master_address",
            master_slave.master_address.as_deref(),
        )?;

        let mut slave_addresses = Vec::with_capacity(master_slave.slave_addresses.len());
        for address in &master_slave.slave_addresses {
            Endpoint::parse("redis.master_slave.slave_addresses", address)?;
            slave_addresses.push(address.trim().to_string());
        }

        Ok(ServersConfig::MasterSlave(MasterSlaveServersConfig {
            connection,
            pool,
            master_address,
            slave_addresses,
            database: require_database("redis.master_slave.database", master_slave.database)?,
        }))
    }

    fn map_sentinel(&self, props: &RedisProperties) -> Result<ServersConfig, ClientError> {
        let sentinel = &props.sentinel;
        let connection = map_connection(&sentinel.common.base);
        let pool = self.map_pool("redis.sentinel", &sentinel.common)?;
        let master_name = sentinel
            .master_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ClientError::invalid_property("redis.sentinel.master_name", "must be set")
            })?;

        Ok(ServersConfig::Sentinel(SentinelServersConfig {
            connection,
            pool,
            master_name: master_name.to_string(),
            sentinel_addresses: require_addresses(
                "redis.sentinel.sentinel_addresses",
                &sentinel.sentinel_addresses,
            )?,
            database: require_database("redis.sentinel.database", sentinel.database)?,
        }))
    }

    fn map_replicated(&self, props: &RedisProperties) -> Result<ServersConfig, ClientError> {
        let replicated = &props.replicated;
        let connection = map_connection(&replicated.common.base);
        let pool = self.map_pool("redis.replicated", &replicated.common)?;

        Ok(ServersConfig::Replicated(ReplicatedServersConfig {
            connection,
            pool,
            node_addresses: require_addresses(
                "redis.replicated.node_addresses",
                &replicated.node_addresses,
            )?,
            scan_interval: replicated.scan_interval,
            database: require_database("redis.replicated.database", replicated.database)?,
        }))
    }

    fn map_pool(
        &self,
        group: &str,
        common: &MasterSlaveBaseProperties,
    ) -> Result<NodePoolConfig, ClientError> {
        let load_balancer = self.load_balancers.create(&common.load_balancer)?;
        debug!(group, load_balancer = load_balancer.key(), "Resolved load balancer");

        Ok(NodePoolConfig {
            load_balancer,
            master_connection_minimum_idle_size: common.master_connection_minimum_idle_size,
            master_connection_pool_size: common.master_connection_pool_size,
            slave_connection_minimum_idle_size: common.slave_connection_minimum_idle_size,
            slave_connection_pool_size: common.slave_connection_pool_size,
            subscription_connection_minimum_idle_size: common
                .subscription_connection_minimum_idle_size,
            subscription_connection_pool_size: common.subscription_connection_pool_size,
            read_mode: common.read_mode,
            subscription_mode: common.subscription_mode,
            dns_monitoring_interval: common.dns_monitoring_interval,
        })
    }
}

/// Build with the default registries and no customizers
pub fn build_client_config(props: &RedisProperties) -> Result<ClientConfig, ClientError> {
    ClientConfigBuilder::default().build(props)
}

fn map_connection(base: &BaseServerProperties) -> ConnectionConfig {
    ConnectionConfig {
        idle_connection_timeout: base.idle_connection_timeout,
        ping_timeout: base.ping_timeout,
        connect_timeout: base.connect_timeout,
        timeout: base.timeout,
        retry_attempts: base.retry_attempts,
        retry_interval: base.retry_interval,
        reconnection_timeout: base.reconnection_timeout,
        failed_attempts: base.failed_attempts,
        username: base.username.clone(),
        password: base.password.clone(),
        subscriptions_per_connection: base.subscriptions_per_connection,
        client_name: base.client_name.clone(),
        ssl: SslConfig {
            enable_endpoint_identification: base.ssl_enable_endpoint_identification,
            provider: base.ssl_provider,
            truststore: base.ssl_truststore.clone(),
            truststore_password: base.ssl_truststore_password.clone(),
            keystore: base.ssl_keystore.clone(),
            keystore_password: base.ssl_keystore_password.clone(),
        },
        ping_connection_interval: base.ping_connection_interval,
        keep_alive: base.keep_alive,
        tcp_no_delay: base.tcp_no_delay,
    }
}

fn require_address(key: &str, address: Option<&str>) -> Result<String, ClientError> {
    let address = address
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ClientError::invalid_property(key, "must be set"))?;
    Endpoint::parse(key, address)?;
    Ok(address.to_string())
}

fn require_addresses(key: &str, addresses: &[String]) -> Result<Vec<String>, ClientError> {
    if addresses.is_empty() {
        return Err(ClientError::invalid_property(
            key,
            "at least one address is required",
        ));
    }
    addresses
        .iter()
        .map(|address| require_address(key, Some(address)))
        .collect()
}

fn require_database(key: &str, database: i64) -> Result<i64, ClientError> {
    if database < 0 {
        return Err(ClientError::invalid_property(
            key,
            format!("database index must not be negative, got {database}"),
        ));
    }
    Ok(database)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::client::balancer::{RandomLoadBalancer, WeightedRoundRobinLoadBalancer};
    use crate::config::{ReadMode, SubscriptionMode, Transport};

    fn props(topology: &str) -> RedisProperties {
        RedisProperties {
            topology_type: topology.to_string(),
            ..RedisProperties::default()
        }
    }

    #[test]
    fn test_default_properties_build_single() {
        let config = build_client_config(&RedisProperties::default()).unwrap();
        let ServersConfig::Single(single) = &config.servers else {
            panic!("expected single");
        };
        assert_eq!(single.address, "redis://127.0.0.1:6379");
        assert_eq!(single.database, 0);
        assert_eq!(single.connection_pool_size, 64);
        assert_eq!(single.dns_monitoring_interval, Some(5_000));
        assert_eq!(config.codec.key(), "json");
        assert_eq!(config.address_resolver.key(), "default");
        assert_eq!(config.lock_watchdog_timeout, 30_000);
    }

    #[test]
    fn test_single_copies_every_field() {
        let mut props = props("single");
        props.single.address = "redis://10.0.0.1:6380".to_string();
        props.single.database = 3;
        props.single.base.timeout = 5_000;
        props.single.base.password = Some("secret".to_string());
        props.single.base.client_name = Some("orders".to_string());
        props.single.dns_monitoring = false;
        props.transport = Transport::NativeEpoll;

        let config = build_client_config(&props).unwrap();
        let ServersConfig::Single(single) = &config.servers else {
            panic!("expected single");
        };
        assert_eq!(single.address, "redis://10.0.0.1:6380");
        assert_eq!(single.database, 3);
        assert_eq!(single.connection.timeout, 5_000);
        assert_eq!(single.connection.password.as_deref(), Some("secret"));
        assert_eq!(single.connection.client_name.as_deref(), Some("orders"));
        assert_eq!(single.dns_monitoring_interval, None);
        assert_eq!(config.transport, Transport::NativeEpoll);
    }

    fn assert_base_connection_defaults(connection: &ConnectionConfig) {
        assert_eq!(connection.idle_connection_timeout, 10_000);
        assert_eq!(connection.ping_timeout, 1_000);
        assert_eq!(connection.connect_timeout, 10_000);
        assert_eq!(connection.timeout, 3_000);
        assert_eq!(connection.retry_attempts, 3);
        assert_eq!(connection.retry_interval, 1_500);
        assert_eq!(connection.reconnection_timeout, 3_000);
        assert_eq!(connection.failed_attempts, 3);
        assert_eq!(connection.subscriptions_per_connection, 5);
        assert_eq!(connection.password, None);
        assert!(connection.ssl.enable_endpoint_identification);
    }

    fn assert_pool_defaults(pool: &NodePoolConfig) {
        assert_eq!(pool.load_balancer.key(), "round-robin");
        assert_eq!(pool.master_connection_minimum_idle_size, 10);
        assert_eq!(pool.master_connection_pool_size, 64);
        assert_eq!(pool.slave_connection_minimum_idle_size, 10);
        assert_eq!(pool.slave_connection_pool_size, 64);
        assert_eq!(pool.subscription_connection_minimum_idle_size, 1);
        assert_eq!(pool.subscription_connection_pool_size, 50);
        assert_eq!(pool.read_mode, ReadMode::Slave);
        assert_eq!(pool.subscription_mode, SubscriptionMode::Slave);
        assert_eq!(pool.dns_monitoring_interval, 5_000);
    }

    #[test]
    fn test_single_defaults() {
        let config = build_client_config(&props("single")).unwrap();
        let ServersConfig::Single(single) = &config.servers else {
            panic!("expected single");
        };
        assert_base_connection_defaults(&single.connection);
        assert_eq!(single.connection_minimum_idle_size, 10);
        assert_eq!(single.connection_pool_size, 64);
        assert_eq!(single.subscription_connection_minimum_idle_size, 1);
        assert_eq!(single.subscription_connection_pool_size, 50);
        assert_eq!(single.dns_monitoring_interval, Some(5_000));
    }

    #[test]
    fn test_cluster_defaults() {
        let mut props = props("cluster");
        props.cluster.node_addresses = vec!["redis://10.0.0.1:7000".to_string()];
        let config = build_client_config(&props).unwrap();
        let ServersConfig::Cluster(cluster) = &config.servers else {
            panic!("expected cluster");
        };
        assert_base_connection_defaults(&cluster.connection);
        assert_pool_defaults(&cluster.pool);
        assert_eq!(cluster.scan_interval, 1_000);
        assert_eq!(cluster.node_addresses, vec!["redis://10.0.0.1:7000"]);
    }

    #[test]
    fn test_master_slave_defaults() {
        let mut props = props("master_slave");
        props.master_slave.master_address = Some("redis://10.0.0.1:6379".to_string());
        let config = build_client_config(&props).unwrap();
        let ServersConfig::MasterSlave(ms) = &config.servers else {
            panic!("expected master_slave");
        };
        assert_base_connection_defaults(&ms.connection);
        assert_pool_defaults(&ms.pool);
        assert_eq!(ms.database, 0);
        assert!(ms.slave_addresses.is_empty());
    }

    #[test]
    fn test_sentinel_defaults() {
        let mut props = props("sentinel");
        props.sentinel.master_name = Some("mymaster".to_string());
        props.sentinel.sentinel_addresses = vec!["redis://10.0.0.1:26379".to_string()];
        let config = build_client_config(&props).unwrap();
        let ServersConfig::Sentinel(sentinel) = &config.servers else {
            panic!("expected sentinel");
        };
        assert_base_connection_defaults(&sentinel.connection);
        assert_pool_defaults(&sentinel.pool);
        assert_eq!(sentinel.database, 0);
    }

    #[test]
    fn test_replicated_defaults() {
        let mut props = props("replicated");
        props.replicated.node_addresses = vec!["redis://10.0.0.1:6379".to_string()];
        let config = build_client_config(&props).unwrap();
        let ServersConfig::Replicated(replicated) = &config.servers else {
            panic!("expected replicated");
        };
        assert_base_connection_defaults(&replicated.connection);
        assert_pool_defaults(&replicated.pool);
        assert_eq!(replicated.scan_interval, 1_000);
        assert_eq!(replicated.database, 0);
    }

    #[test]
    fn test_cluster_with_two_nodes() {
        let mut props = props("cluster");
        props.cluster.node_addresses = vec![
            "redis://10.0.0.1:7000".to_string(),
            "redis://10.0.0.2:7000".to_string(),
        ];
        props.cluster.common.read_mode = ReadMode::Master;
        props.cluster.scan_interval = 2_000;

        let config = build_client_config(&props).unwrap();
        assert_eq!(config.topology(), TopologyType::Cluster);
        let ServersConfig::Cluster(cluster) = &config.servers else {
            panic!("expected cluster");
        };
        assert_eq!(cluster.node_addresses.len(), 2);
        assert_eq!(cluster.scan_interval, 2_000);
        assert_eq!(cluster.pool.read_mode, ReadMode::Master);
        assert_eq!(cluster.pool.load_balancer.key(), "round-robin");
    }

    #[test]
    fn test_unknown_topology_names_value() {
        let err = build_client_config(&props("quorum")).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedTopology(ref v) if v == "quorum"));
        assert!(err.to_string().contains("quorum"));
    }

    #[test]
    fn test_disabled_topology() {
        assert!(matches!(
            build_client_config(&props("none")),
            Err(ClientError::Disabled)
        ));
    }

    #[test]
    fn test_sentinel_requires_master_name() {
        let mut props = props("sentinel");
        props.sentinel.sentinel_addresses = vec!["redis://10.0.0.1:26379".to_string()];
        let err = build_client_config(&props).unwrap_err();
        assert!(
            matches!(err, ClientError::InvalidProperty { ref key, .. } if key == "redis.sentinel.master_name")
        );

        props.sentinel.master_name = Some("mymaster".to_string());
        let config = build_client_config(&props).unwrap();
        let ServersConfig::Sentinel(sentinel) = &config.servers else {
            panic!("expected sentinel");
        };
        assert_eq!(sentinel.master_name, "mymaster");
    }

    #[test]
    fn test_empty_address_lists_rejected() {
        for (topology, key) in [
            ("cluster", "redis.cluster.node_addresses"),
            ("replicated", "redis.replicated.node_addresses"),
            ("master_slave", "redis.master_slave.master_address"),
        ] {
            let err = build_client_config(&props(topology)).unwrap_err();
            assert!(
                matches!(err, ClientError::InvalidProperty { key: ref k, .. } if k == key),
                "{topology}: {err}"
            );
        }
    }

    #[test]
    fn test_master_slave_maps_replicas() {
        let mut props = props("MASTER-SLAVE");
        props.master_slave.master_address = Some("redis://10.0.0.1:6379".to_string());
        props.master_slave.slave_addresses = vec!["redis://10.0.0.2:6379".to_string()];
        props.master_slave.common.load_balancer = "random".to_string();

        let config = build_client_config(&props).unwrap();
        let ServersConfig::MasterSlave(ms) = &config.servers else {
            panic!("expected master_slave");
        };
        assert_eq!(ms.master_address, "redis://10.0.0.1:6379");
        assert_eq!(ms.slave_addresses, vec!["redis://10.0.0.2:6379"]);
        assert_eq!(ms.pool.load_balancer.key(), "random");
    }

    #[test]
    fn test_unknown_strategy_keys_fail_fast() {
        let mut props = props("single");
        props.codec = "kryo".to_string();
        let err = build_client_config(&props).unwrap_err();
        assert!(matches!(err, ClientError::UnknownStrategy { kind: "codec", ref key, .. } if key == "kryo"));

        let mut props = RedisProperties::default();
        props.address_resolver = "static".to_string();
        assert!(matches!(
            build_client_config(&props),
            Err(ClientError::UnknownStrategy { kind: "address resolver", .. })
        ));
    }

    #[test]
    fn test_weighted_balancer_needs_code_registration() {
        let mut props = props("cluster");
        props.cluster.node_addresses = vec!["redis://10.0.0.1:7000".to_string()];
        props.cluster.common.load_balancer = "weighted_round_robin".to_string();
        assert!(matches!(
            build_client_config(&props),
            Err(ClientError::UnsupportedStrategy { .. })
        ));

        let mut builder = ClientConfigBuilder::new();
        builder
            .load_balancers_mut()
            .register("weighted_round_robin", || {
                Ok(Arc::new(WeightedRoundRobinLoadBalancer::new(Default::default(), 1))
                    as Arc<dyn LoadBalancer>)
            });
        let config = builder.build(&props).unwrap();
        let ServersConfig::Cluster(cluster) = &config.servers else {
            panic!("expected cluster");
        };
        assert_eq!(cluster.pool.load_balancer.key(), "weighted-round-robin");
    }

    #[test]
    fn test_independent_builds_do_not_share_strategies() {
        let mut props = props("cluster");
        props.cluster.node_addresses = vec!["redis://10.0.0.1:7000".to_string()];
        let a = build_client_config(&props).unwrap();
        let b = build_client_config(&props).unwrap();
        let (ServersConfig::Cluster(a), ServersConfig::Cluster(b)) = (&a.servers, &b.servers) else {
            panic!("expected cluster");
        };
        assert!(!a.pool.load_balancer.shares_instance(&b.pool.load_balancer));
    }

    #[test]
    fn test_custom_registry_entry() {
        let mut builder = ClientConfigBuilder::new();
        builder.load_balancers_mut().register("sticky", || {
            Ok(Arc::new(RandomLoadBalancer) as Arc<dyn LoadBalancer>)
        });
        let mut props = props("replicated");
        props.replicated.node_addresses = vec!["redis://10.0.0.1:6379".to_string()];
        props.replicated.common.load_balancer = "sticky".to_string();
        assert!(builder.build(&props).is_ok());
    }

    #[test]
    fn test_customizers_run_in_order() {
        let builder = ClientConfigBuilder::new()
            .with_customizer(|config: &mut ClientConfig| {
                config.threads = 4;
                Ok(())
            })
            .with_customizer(|config: &mut ClientConfig| {
                config.threads *= 2;
                Ok(())
            });
        let config = builder.build(&RedisProperties::default()).unwrap();
        assert_eq!(config.threads, 8);
    }

    #[test]
    fn test_config_file_wins_over_properties() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "servers:\n  single:\n    address: redis://10.9.9.9:6390\n    database: 5"
        )
        .unwrap();

        let mut props = props("cluster");
        props.cluster.node_addresses.clear();
        props.config.location = Some(file.path().to_path_buf());

        let config = build_client_config(&props).unwrap();
        let ServersConfig::Single(single) = &config.servers else {
            panic!("expected single from file");
        };
        assert_eq!(single.address, "redis://10.9.9.9:6390");
        assert_eq!(single.database, 5);
        assert_eq!(config, ClientConfig::from_path(file.path()).unwrap());
    }

    #[test]
    fn test_missing_config_file_is_reported() {
        let mut props = RedisProperties::default();
        props.config.location = Some("/nonexistent/client.json".into());
        assert!(matches!(
            build_client_config(&props),
            Err(ClientError::ConfigFile { .. })
        ));
    }

    #[test]
    fn test_negative_database_rejected() {
        let mut props = RedisProperties::default();
        props.single.database = -1;
        assert!(build_client_config(&props).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_topology() -> impl Strategy<Value = String> {
            (
                prop_oneof![
                    Just("single"),
                    Just("cluster"),
                    Just("master_slave"),
                    Just("sentinel"),
                    Just("replicated"),
                ],
                any::<bool>(),
                any::<bool>(),
            )
                .prop_map(|(name, upper, dashed)| {
                    let name = if dashed { name.replace('_', "-") } else { name.to_string() };
                    if upper { name.to_uppercase() } else { name }
                })
        }

        fn arb_properties() -> impl Strategy<Value = RedisProperties> {
            (arb_topology(), 1u16..u16::MAX, 0i64..16, 0u64..60_000)
                .prop_map(|(topology, port, database, timeout)| {
                    let address = format!("redis://10.0.0.1:{port}");
                    let mut props = props(&topology);
                    props.single.address = address.clone();
                    props.single.database = database;
                    props.single.base.timeout = timeout;
                    props.cluster.node_addresses = vec![address.clone()];
                    props.master_slave.master_address = Some(address.clone());
                    props.sentinel.sentinel_addresses = vec![address.clone()];
                    props.sentinel.master_name = Some("mymaster".to_string());
                    props.replicated.node_addresses = vec![address];
                    props
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_build_is_pure_and_deterministic(props in arb_properties()) {
                let before = props.clone();
                let first = build_client_config(&props).unwrap();
                let second = build_client_config(&props).unwrap();
                prop_assert_eq!(&props, &before);
                prop_assert_eq!(&first, &second);
                prop_assert_eq!(first.topology(), props.topology().unwrap());
            }
        }
    }
}
