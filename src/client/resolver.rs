//! Host name resolution for node addresses

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::client::registry::{DefaultRegistry, Strategy, StrategyRegistry};

pub const DEFAULT: &str = "default";
pub const ROUND_ROBIN: &str = "round-robin";

pub trait AddressResolver: Strategy {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// System resolver, results in the order returned
#[derive(Debug, Default)]
pub struct DefaultAddressResolver;

impl Strategy for DefaultAddressResolver {
    fn name(&self) -> &str {
        DEFAULT
    }
}

impl AddressResolver for DefaultAddressResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok((host, port).to_socket_addrs()?.collect())
    }
}

/// System resolver, results rotated by one on every call
#[derive(Debug, Default)]
pub struct RoundRobinAddressResolver {
    counter: AtomicUsize,
}

impl Strategy for RoundRobinAddressResolver {
    fn name(&self) -> &str {
        ROUND_ROBIN
    }
}

impl AddressResolver for RoundRobinAddressResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let mut addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
        if !addrs.is_empty() {
            let shift = self.counter.fetch_add(1, Ordering::Relaxed) % addrs.len();
            addrs.rotate_left(shift);
        }
        Ok(addrs)
    }
}

impl DefaultRegistry for dyn AddressResolver {
    fn default_registry() -> StrategyRegistry<Self> {
        StrategyRegistry::new("address resolver")
            .with(DEFAULT, || Ok(Arc::new(DefaultAddressResolver) as Arc<dyn AddressResolver>))
            .with(ROUND_ROBIN, || {
                Ok(Arc::new(RoundRobinAddressResolver::default()) as Arc<dyn AddressResolver>)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_ip_resolves_without_dns() {
        let addrs = DefaultAddressResolver.resolve("127.0.0.1", 6379).unwrap();
        assert_eq!(addrs, vec!["127.0.0.1:6379".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_round_robin_resolver_on_single_address() {
        let resolver = RoundRobinAddressResolver::default();
        for _ in 0..3 {
            assert_eq!(resolver.resolve("127.0.0.1", 7000).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_registry_accepts_underscored_key() {
        let registry = <dyn AddressResolver>::default_registry();
        assert_eq!(registry.create("ROUND_ROBIN").unwrap().name(), ROUND_ROBIN);
    }
}
