//! Redis client construction
//!
//! - [`builder`] maps bound properties (or a client config file) to a
//!   [`ClientConfig`]
//! - [`registry`] resolves load balancer, codec and address resolver keys
//! - [`handle`] owns the live [`RedisClient`]

pub mod balancer;
pub mod builder;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod registry;
pub mod resolver;

pub use balancer::{
    LoadBalancer, RandomLoadBalancer, RoundRobinLoadBalancer, WeightedRoundRobinLoadBalancer,
};
pub use builder::{ClientConfigBuilder, ClientConfigCustomizer, build_client_config};
pub use codec::{ByteArrayCodec, Codec, CodecError, JsonCodec, MsgPackCodec, StringCodec};
pub use config::{
    ClientConfig, ClusterServersConfig, ConnectionConfig, Endpoint, MasterSlaveServersConfig,
    NodePoolConfig, ReplicatedServersConfig, SentinelServersConfig, ServersConfig,
    SingleServerConfig, SslConfig,
};
pub use error::ClientError;
pub use handle::{RedisClient, RedisConnection};
pub use registry::{DefaultRegistry, Strategy, StrategyRef, StrategyRegistry};
pub use resolver::{AddressResolver, DefaultAddressResolver, RoundRobinAddressResolver};
