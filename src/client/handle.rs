//! Live Redis client
//!
//! Creating a [`RedisClient`] never touches the network: node pools are
//! built on first use, and sentinel or replicated masters are discovered by
//! the first command that needs them.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bb8::{CustomizeConnection, Pool, PooledConnection};
use redis::aio::{ConnectionLike, MultiplexedConnection};
use redis::cluster::{ClusterClient, ClusterClientBuilder};
use redis::cluster_async::ClusterConnection;
use redis::cluster_read_routing::{RandomReplicaStrategy, RoundRobinReplicaStrategy};
use redis::io::tcp::TcpSettings;
use redis::io::tcp::socket2::TcpKeepalive;
use redis::{Client, Cmd, IntoConnectionInfo, Pipeline, RedisError, RedisFuture, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::client::balancer;
use crate::client::codec::Codec;
use crate::client::config::{
    ClientConfig, ClusterServersConfig, ConnectionConfig, Endpoint, MasterSlaveServersConfig,
    NodePoolConfig, ReplicatedServersConfig, SentinelServersConfig, ServersConfig,
    SingleServerConfig,
};
use crate::client::registry::StrategyRef;
use crate::config::{ReadMode, TopologyType};

// ============================================================================
// Node pools
// ============================================================================

/// Socket options from `tcp_no_delay` and `keep_alive`
fn tcp_settings(connection: &ConnectionConfig) -> TcpSettings {
    let settings = TcpSettings::default().set_nodelay(connection.tcp_no_delay);
    if connection.keep_alive {
        settings.set_keepalive(TcpKeepalive::new())
    } else {
        settings
    }
}

fn open_client(
    endpoint: &Endpoint,
    connection: &ConnectionConfig,
    database: i64,
) -> Result<Client, ClientError> {
    let info = endpoint
        .url(connection, database)
        .into_connection_info()?
        .set_tcp_settings(tcp_settings(connection));
    Ok(Client::open(info)?)
}

/// Sends `CLIENT SETNAME` on every new pooled connection
#[derive(Debug)]
struct ClientNameCustomizer(String);

impl CustomizeConnection<MultiplexedConnection, RedisError> for ClientNameCustomizer {
    fn on_acquire<'a>(
        &'a self,
        connection: &'a mut MultiplexedConnection,
    ) -> Pin<Box<dyn Future<Output = Result<(), RedisError>> + Send + 'a>> {
        Box::pin(async move {
            let _: () = redis::cmd("CLIENT")
                .arg("SETNAME")
                .arg(&self.0)
                .query_async(connection)
                .await?;
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct PoolSettings {
    max_size: u32,
    min_idle: u32,
    connect_timeout: Duration,
    idle_timeout: Option<Duration>,
    /// PING connections on checkout, on when `ping_connection_interval` > 0
    test_on_check_out: bool,
}

impl PoolSettings {
    fn new(pool_size: u32, minimum_idle: u32, connection: &ConnectionConfig) -> Self {
        let max_size = pool_size.max(1);
        Self {
            max_size,
            min_idle: minimum_idle.min(max_size),
            connect_timeout: connection.connect_timeout().max(Duration::from_millis(1)),
            idle_timeout: connection.idle_timeout(),
            test_on_check_out: connection.ping_connection_interval > 0,
        }
    }
}

/// Connection pool for one node, created lazily
struct NodePool {
    address: String,
    client: Client,
    client_name: Option<String>,
    settings: PoolSettings,
    pool: OnceCell<Pool<Client>>,
}

impl NodePool {
    fn new(
        endpoint: &Endpoint,
        connection: &ConnectionConfig,
        database: i64,
        settings: PoolSettings,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            address: endpoint.to_string(),
            client: open_client(endpoint, connection, database)?,
            client_name: connection.client_name.clone(),
            settings,
            pool: OnceCell::new(),
        })
    }

    async fn get(&self) -> Result<PooledConnection<'_, Client>, ClientError> {
        let pool = self
            .pool
            .get_or_init(|| async {
                debug!(address = %self.address, max_size = self.settings.max_size, "Creating connection pool");
                let mut builder = Pool::builder()
                    .max_size(self.settings.max_size)
                    .min_idle(Some(self.settings.min_idle))
                    .connection_timeout(self.settings.connect_timeout)
                    .idle_timeout(self.settings.idle_timeout)
                    .test_on_check_out(self.settings.test_on_check_out);
                if let Some(name) = &self.client_name {
                    builder = builder.connection_customizer(Box::new(ClientNameCustomizer(name.clone())));
                }
                builder.build_unchecked(self.client.clone())
            })
            .await;
        Ok(pool.get().await?)
    }
}

/// A master with its replicas
struct Nodes {
    master: NodePool,
    slaves: Vec<NodePool>,
}

impl Nodes {
    fn build(
        master: &Endpoint,
        slaves: &[Endpoint],
        connection: &ConnectionConfig,
        pool: &NodePoolConfig,
        database: i64,
    ) -> Result<Self, ClientError> {
        let master_settings = PoolSettings::new(
            pool.master_connection_pool_size,
            pool.master_connection_minimum_idle_size,
            connection,
        );
        let slave_settings = PoolSettings::new(
            pool.slave_connection_pool_size,
            pool.slave_connection_minimum_idle_size,
            connection,
        );
        Ok(Self {
            master: NodePool::new(master, connection, database, master_settings)?,
            slaves: slaves
                .iter()
                .map(|slave| NodePool::new(slave, connection, database, slave_settings))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Node serving reads under `pool.read_mode`, falling back to the master
    fn reader(&self, pool: &NodePoolConfig) -> &NodePool {
        let candidates: Vec<&NodePool> = match pool.read_mode {
            ReadMode::Master => return &self.master,
            ReadMode::Slave => self.slaves.iter().collect(),
            ReadMode::MasterSlave => std::iter::once(&self.master)
                .chain(self.slaves.iter())
                .collect(),
        };
        let addresses: Vec<String> = candidates.iter().map(|n| n.address.clone()).collect();
        pool.load_balancer
            .select(&addresses)
            .and_then(|index| candidates.get(index).copied())
            .unwrap_or(&self.master)
    }
}

// ============================================================================
// Master discovery
// ============================================================================

enum Discovery {
    Sentinel {
        sentinels: Vec<Client>,
        master_name: String,
        tls: bool,
    },
    Replicated {
        nodes: Vec<(Endpoint, Client)>,
    },
}

struct DiscoveredNodes {
    discovery: Discovery,
    connection: ConnectionConfig,
    pool: NodePoolConfig,
    database: i64,
    nodes: OnceCell<Nodes>,
}

impl DiscoveredNodes {
    async fn nodes(&self) -> Result<&Nodes, ClientError> {
        self.nodes.get_or_try_init(|| self.discover()).await
    }

    async fn discover(&self) -> Result<Nodes, ClientError> {
        let (master, slaves) = match &self.discovery {
            Discovery::Sentinel {
                sentinels,
                master_name,
                tls,
            } => discover_from_sentinels(sentinels, master_name, *tls).await?,
            Discovery::Replicated { nodes } => discover_replicated_master(nodes).await?,
        };
        info!(master = %master, slaves = slaves.len(), "Discovered master");
        Nodes::build(&master, &slaves, &self.connection, &self.pool, self.database)
    }
}

async fn discover_from_sentinels(
    sentinels: &[Client],
    master_name: &str,
    tls: bool,
) -> Result<(Endpoint, Vec<Endpoint>), ClientError> {
    let mut last_error = None;
    for sentinel in sentinels {
        let mut conn = match sentinel.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Sentinel unreachable");
                last_error = Some(e);
                continue;
            }
        };

        let master: Option<(String, u16)> = match redis::cmd("SENTINEL")
            .arg("get-master-addr-by-name")
            .arg(master_name)
            .query_async(&mut conn)
            .await
        {
            Ok(master) => master,
            Err(e) => {
                warn!(error = %e, "Sentinel failed to report master");
                last_error = Some(e);
                continue;
            }
        };
        let Some((host, port)) = master else {
            continue;
        };

        let replicas: Vec<HashMap<String, String>> = match redis::cmd("SENTINEL")
            .arg("replicas")
            .arg(master_name)
            .query_async(&mut conn)
            .await
        {
            Ok(replicas) => replicas,
            Err(e) => {
                warn!(error = %e, "Sentinel failed to list replicas, reads go to the master");
                Vec::new()
            }
        };
        let slaves = healthy_replicas(&replicas, tls);

        return Ok((Endpoint { tls, host, port }, slaves));
    }

    match last_error {
        Some(e) => Err(ClientError::Connection(e)),
        None => Err(ClientError::MasterNotFound(format!(
            "no sentinel knows master '{master_name}'"
        ))),
    }
}

/// Replicas from `SENTINEL replicas` that are neither down nor disconnected
fn healthy_replicas(replicas: &[HashMap<String, String>], tls: bool) -> Vec<Endpoint> {
    replicas
        .iter()
        .filter(|replica| {
            replica
                .get("flags")
                .is_none_or(|flags| !flags.contains("s_down") && !flags.contains("disconnected"))
        })
        .filter_map(|replica| {
            let host = replica.get("ip")?;
            let port = replica.get("port")?.parse().ok()?;
            Some(Endpoint {
                tls,
                host: host.clone(),
                port,
            })
        })
        .collect()
}

async fn discover_replicated_master(
    nodes: &[(Endpoint, Client)],
) -> Result<(Endpoint, Vec<Endpoint>), ClientError> {
    let mut master = None;
    let mut last_error = None;
    for (endpoint, client) in nodes {
        let info: Result<String, redis::RedisError> = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            redis::cmd("INFO")
                .arg("replication")
                .query_async(&mut conn)
                .await
        }
        .await;
        match info {
            Ok(info) if info.lines().any(|line| line.trim() == "role:master") => {
                master = Some(endpoint.clone());
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(node = %endpoint, error = %e, "Replicated node unreachable");
                last_error = Some(e);
            }
        }
    }

    let Some(master) = master else {
        return Err(match last_error {
            Some(e) => ClientError::Connection(e),
            None => ClientError::MasterNotFound("no node reports role:master".to_string()),
        });
    };
    let slaves = nodes
        .iter()
        .map(|(endpoint, _)| endpoint)
        .filter(|endpoint| **endpoint != master)
        .cloned()
        .collect();
    Ok((master, slaves))
}

// ============================================================================
// Connections
// ============================================================================

/// A connection checked out from the client
///
/// Implements [`ConnectionLike`], so it can be passed to `query_async`.
pub enum RedisConnection<'a> {
    Pooled(PooledConnection<'a, Client>),
    Cluster(ClusterConnection),
}

impl ConnectionLike for RedisConnection<'_> {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        match self {
            RedisConnection::Pooled(conn) => {
                let conn: &mut MultiplexedConnection = conn;
                conn.req_packed_command(cmd)
            }
            RedisConnection::Cluster(conn) => conn.req_packed_command(cmd),
        }
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        match self {
            RedisConnection::Pooled(conn) => {
                let conn: &mut MultiplexedConnection = conn;
                conn.req_packed_commands(cmd, offset, count)
            }
            RedisConnection::Cluster(conn) => conn.req_packed_commands(cmd, offset, count),
        }
    }

    fn get_db(&self) -> i64 {
        match self {
            RedisConnection::Pooled(conn) => {
                let conn: &MultiplexedConnection = conn;
                conn.get_db()
            }
            RedisConnection::Cluster(conn) => conn.get_db(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

enum Topology {
    Single(NodePool),
    MasterSlave {
        nodes: Nodes,
        pool: NodePoolConfig,
    },
    Discovered(DiscoveredNodes),
    Cluster {
        client: ClusterClient,
        connection: OnceCell<ClusterConnection>,
    },
}

/// Handle on the configured Redis deployment
pub struct RedisClient {
    config: ClientConfig,
    topology: Topology,
    closed: AtomicBool,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("topology", &self.config.topology())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RedisClient {
    /// Create a client without connecting
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let topology = match &config.servers {
            ServersConfig::Single(single) => single_topology(single)?,
            ServersConfig::Cluster(cluster) => cluster_topology(cluster)?,
            ServersConfig::MasterSlave(ms) => master_slave_topology(ms)?,
            ServersConfig::Sentinel(sentinel) => sentinel_topology(sentinel)?,
            ServersConfig::Replicated(replicated) => replicated_topology(replicated)?,
        };
        info!(
            topology = %config.topology(),
            codec = config.codec.key(),
            "Redis client created"
        );
        Ok(Self {
            config,
            topology,
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn topology(&self) -> TopologyType {
        self.config.topology()
    }

    pub fn codec(&self) -> &StrategyRef<dyn Codec> {
        &self.config.codec
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Mark the client closed; returns `false` if it already was
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(topology = %self.config.topology(), "Redis client shut down");
        true
    }

    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        Ok(())
    }

    /// Connection to the master (or the cluster)
    pub async fn connection(&self) -> Result<RedisConnection<'_>, ClientError> {
        self.ensure_open()?;
        match &self.topology {
            Topology::Single(node) => Ok(RedisConnection::Pooled(node.get().await?)),
            Topology::MasterSlave { nodes, .. } => {
                Ok(RedisConnection::Pooled(nodes.master.get().await?))
            }
            Topology::Discovered(discovered) => {
                let nodes = discovered.nodes().await?;
                Ok(RedisConnection::Pooled(nodes.master.get().await?))
            }
            Topology::Cluster { .. } => self.cluster_connection().await,
        }
    }

    /// Connection for read commands, routed by `read_mode`
    pub async fn read_connection(&self) -> Result<RedisConnection<'_>, ClientError> {
        self.ensure_open()?;
        match &self.topology {
            Topology::Single(node) => Ok(RedisConnection::Pooled(node.get().await?)),
            Topology::MasterSlave { nodes, pool } => {
                Ok(RedisConnection::Pooled(nodes.reader(pool).get().await?))
            }
            Topology::Discovered(discovered) => {
                let nodes = discovered.nodes().await?;
                Ok(RedisConnection::Pooled(
                    nodes.reader(&discovered.pool).get().await?,
                ))
            }
            Topology::Cluster { .. } => self.cluster_connection().await,
        }
    }

    async fn cluster_connection(&self) -> Result<RedisConnection<'_>, ClientError> {
        let Topology::Cluster { client, connection } = &self.topology else {
            return Err(ClientError::Unsupported(
                "not a cluster topology".to_string(),
            ));
        };
        let conn = connection
            .get_or_try_init(|| client.get_async_connection())
            .await?;
        Ok(RedisConnection::Cluster(conn.clone()))
    }

    pub async fn ping(&self) -> Result<String, ClientError> {
        let mut conn = self.connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }

    /// Resolve every configured address with the configured resolver
    pub fn resolve_addresses(&self) -> Vec<(String, io::Result<Vec<SocketAddr>>)> {
        self.config
            .servers
            .addresses()
            .into_iter()
            .map(|address| {
                let resolved = Endpoint::parse("address", address)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
                    .and_then(|endpoint| {
                        self.config
                            .address_resolver
                            .resolve(&endpoint.host, endpoint.port)
                    });
                (address.to_string(), resolved)
            })
            .collect()
    }
}

fn endpoints(key: &str, addresses: &[String]) -> Result<Vec<Endpoint>, ClientError> {
    addresses.iter().map(|a| Endpoint::parse(key, a)).collect()
}

fn single_topology(single: &SingleServerConfig) -> Result<Topology, ClientError> {
    let endpoint = Endpoint::parse("single.address", &single.address)?;
    let settings = PoolSettings::new(
        single.connection_pool_size,
        single.connection_minimum_idle_size,
        &single.connection,
    );
    Ok(Topology::Single(NodePool::new(
        &endpoint,
        &single.connection,
        single.database,
        settings,
    )?))
}

fn master_slave_topology(ms: &MasterSlaveServersConfig) -> Result<Topology, ClientError> {
    let master = Endpoint::parse("master_slave.master_address", &ms.master_address)?;
    let slaves = endpoints("master_slave.slave_addresses", &ms.slave_addresses)?;
    Ok(Topology::MasterSlave {
        nodes: Nodes::build(&master, &slaves, &ms.connection, &ms.pool, ms.database)?,
        pool: ms.pool.clone(),
    })
}

fn sentinel_topology(sentinel: &SentinelServersConfig) -> Result<Topology, ClientError> {
    let addresses = endpoints("sentinel.sentinel_addresses", &sentinel.sentinel_addresses)?;
    let tls = addresses.first().is_some_and(|e| e.tls);
    let sentinels = addresses
        .iter()
        .map(|endpoint| open_client(endpoint, &sentinel.connection, 0))
        .collect::<Result<_, _>>()?;
    Ok(Topology::Discovered(DiscoveredNodes {
        discovery: Discovery::Sentinel {
            sentinels,
            master_name: sentinel.master_name.clone(),
            tls,
        },
        connection: sentinel.connection.clone(),
        pool: sentinel.pool.clone(),
        database: sentinel.database,
        nodes: OnceCell::new(),
    }))
}

fn replicated_topology(replicated: &ReplicatedServersConfig) -> Result<Topology, ClientError> {
    let nodes = endpoints("replicated.node_addresses", &replicated.node_addresses)?
        .into_iter()
        .map(|endpoint| {
            let client = open_client(&endpoint, &replicated.connection, 0)?;
            Ok((endpoint, client))
        })
        .collect::<Result<_, ClientError>>()?;
    Ok(Topology::Discovered(DiscoveredNodes {
        discovery: Discovery::Replicated { nodes },
        connection: replicated.connection.clone(),
        pool: replicated.pool.clone(),
        database: replicated.database,
        nodes: OnceCell::new(),
    }))
}

fn cluster_topology(cluster: &ClusterServersConfig) -> Result<Topology, ClientError> {
    let connection = &cluster.connection;
    let nodes: Vec<String> = endpoints("cluster.node_addresses", &cluster.node_addresses)?
        .iter()
        .map(|endpoint| endpoint.url(connection, 0))
        .collect();

    let mut builder = ClusterClientBuilder::new(nodes)
        .retries(cluster.connection.retry_attempts)
        .connection_timeout(connection.connect_timeout())
        .response_timeout(connection.response_timeout())
        .tcp_settings(tcp_settings(connection));
    if let Some(username) = &connection.username {
        builder = builder.username(username.clone());
    }
    if let Some(password) = &connection.password {
        builder = builder.password(password.clone());
    }
    if cluster.pool.read_mode != ReadMode::Master {
        builder = if cluster.pool.load_balancer.key() == balancer::RANDOM {
            builder.read_routing_strategy(RandomReplicaStrategy)
        } else {
            builder.read_routing_strategy(RoundRobinReplicaStrategy::default())
        };
    }

    Ok(Topology::Cluster {
        client: builder.build()?,
        connection: OnceCell::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::builder::build_client_config;
    use crate::config::RedisProperties;

    fn single_client() -> RedisClient {
        RedisClient::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_creation_does_not_connect() {
        let client = single_client();
        assert_eq!(client.topology(), TopologyType::Single);
        assert!(!client.is_closed());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let client = single_client();
        assert!(client.shutdown());
        assert!(!client.shutdown());
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_closed_client_refuses_connections() {
        let client = single_client();
        client.shutdown();
        assert!(matches!(client.connection().await, Err(ClientError::Closed)));
        assert!(matches!(client.read_connection().await, Err(ClientError::Closed)));
    }

    #[test]
    fn test_every_topology_can_be_created_offline() {
        let mut props = RedisProperties::default();
        props.topology_type = "cluster".to_string();
        props.cluster.node_addresses = vec!["redis://127.0.0.1:7000".to_string()];
        assert!(RedisClient::new(build_client_config(&props).unwrap()).is_ok());

        props.topology_type = "sentinel".to_string();
        props.sentinel.sentinel_addresses = vec!["redis://127.0.0.1:26379".to_string()];
        props.sentinel.master_name = Some("mymaster".to_string());
        assert!(RedisClient::new(build_client_config(&props).unwrap()).is_ok());

        props.topology_type = "replicated".to_string();
        props.replicated.node_addresses = vec!["redis://127.0.0.1:6379".to_string()];
        assert!(RedisClient::new(build_client_config(&props).unwrap()).is_ok());

        props.topology_type = "master_slave".to_string();
        props.master_slave.master_address = Some("redis://127.0.0.1:6379".to_string());
        assert!(RedisClient::new(build_client_config(&props).unwrap()).is_ok());
    }

    #[test]
    fn test_reader_follows_read_mode() {
        let master = Endpoint::parse("k", "redis://10.0.0.1:6379").unwrap();
        let slaves = vec![
            Endpoint::parse("k", "redis://10.0.0.2:6379").unwrap(),
            Endpoint::parse("k", "redis://10.0.0.3:6379").unwrap(),
        ];
        let connection = ConnectionConfig::default();
        let mut pool = NodePoolConfig::default();
        let nodes = Nodes::build(&master, &slaves, &connection, &pool, 0).unwrap();

        assert_eq!(nodes.reader(&pool).address, "redis://10.0.0.2:6379");
        assert_eq!(nodes.reader(&pool).address, "redis://10.0.0.3:6379");

        pool.read_mode = ReadMode::Master;
        assert_eq!(nodes.reader(&pool).address, "redis://10.0.0.1:6379");

        let no_slaves = Nodes::build(&master, &[], &connection, &pool, 0).unwrap();
        pool.read_mode = ReadMode::Slave;
        assert_eq!(no_slaves.reader(&pool).address, "redis://10.0.0.1:6379");
    }

    #[test]
    fn test_socket_options_follow_connection_settings() {
        let mut connection = ConnectionConfig::default();
        let settings = tcp_settings(&connection);
        assert!(!settings.nodelay());
        assert!(settings.keepalive().is_none());

        connection.tcp_no_delay = true;
        connection.keep_alive = true;
        let settings = tcp_settings(&connection);
        assert!(settings.nodelay());
        assert!(settings.keepalive().is_some());
    }

    #[test]
    fn test_pool_checkout_ping_follows_interval() {
        let mut connection = ConnectionConfig::default();
        assert!(!PoolSettings::new(64, 10, &connection).test_on_check_out);
        connection.ping_connection_interval = 30_000;
        assert!(PoolSettings::new(64, 10, &connection).test_on_check_out);
    }

    #[test]
    fn test_client_name_reaches_node_pools() {
        let endpoint = Endpoint::parse("k", "redis://10.0.0.1:6379").unwrap();
        let mut connection = ConnectionConfig::default();
        connection.client_name = Some("orders".to_string());
        connection.tcp_no_delay = true;
        let settings = PoolSettings::new(8, 1, &connection);
        let node = NodePool::new(&endpoint, &connection, 0, settings).unwrap();
        assert_eq!(node.client_name.as_deref(), Some("orders"));
        assert!(node.client.get_connection_info().tcp_settings().nodelay());
    }

    #[test]
    fn test_healthy_replicas_skip_down_nodes() {
        let replica = |ip: &str, port: &str, flags: &str| {
            HashMap::from([
                ("ip".to_string(), ip.to_string()),
                ("port".to_string(), port.to_string()),
                ("flags".to_string(), flags.to_string()),
            ])
        };
        let replicas = vec![
            replica("10.0.0.2", "6379", "slave"),
            replica("10.0.0.3", "6379", "s_down,slave"),
            replica("10.0.0.4", "6379", "slave,disconnected"),
            replica("10.0.0.5", "not-a-port", "slave"),
        ];
        let healthy = healthy_replicas(&replicas, false);
        assert_eq!(healthy.len(), 1);
        assert_eq!(healthy[0].to_string(), "redis://10.0.0.2:6379");
        assert!(healthy_replicas(&[], true).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_sentinels_report_last_error() {
        let mut props = RedisProperties::default();
        props.topology_type = "sentinel".to_string();
        props.sentinel.master_name = Some("mymaster".to_string());
        props.sentinel.sentinel_addresses = vec![
            "redis://127.0.0.1:1".to_string(),
            "redis://127.0.0.1:2".to_string(),
        ];
        let client = RedisClient::new(build_client_config(&props).unwrap()).unwrap();
        let err = client.connection().await.err().unwrap();
        assert!(matches!(err, ClientError::Connection(_)), "{err}");
    }

    #[test]
    fn test_resolve_literal_addresses() {
        let client = single_client();
        let resolved = client.resolve_addresses();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, "redis://127.0.0.1:6379");
        assert_eq!(resolved[0].1.as_ref().unwrap().len(), 1);
    }
}
