//! Replica load balancers
//!
//! Pick which replica serves a read when more than one is eligible.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::client::ClientError;
use crate::client::registry::{DefaultRegistry, Strategy, StrategyRegistry};

pub const ROUND_ROBIN: &str = "round-robin";
pub const RANDOM: &str = "random";
pub const WEIGHTED_ROUND_ROBIN: &str = "weighted-round-robin";

/// Chooses one of several candidate node addresses
pub trait LoadBalancer: Strategy {
    /// Index into `candidates`, `None` when there is nothing to choose
    fn select(&self, candidates: &[String]) -> Option<usize>;
}

#[derive(Debug, Default)]
pub struct RoundRobinLoadBalancer {
    counter: AtomicUsize,
}

impl RoundRobinLoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for RoundRobinLoadBalancer {
    fn name(&self) -> &str {
        ROUND_ROBIN
    }
}

impl LoadBalancer for RoundRobinLoadBalancer {
    fn select(&self, candidates: &[String]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        Some(self.counter.fetch_add(1, Ordering::Relaxed) % candidates.len())
    }
}

#[derive(Debug, Default)]
pub struct RandomLoadBalancer;

impl Strategy for RandomLoadBalancer {
    fn name(&self) -> &str {
        RANDOM
    }
}

impl LoadBalancer for RandomLoadBalancer {
    fn select(&self, candidates: &[String]) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        Some(rand::rng().random_range(0..candidates.len()))
    }
}

/// Round robin where each address appears `weight` times per cycle
///
/// Needs per-address weights, so it can only be registered in code.
#[derive(Debug)]
pub struct WeightedRoundRobinLoadBalancer {
    weights: HashMap<String, u32>,
    default_weight: u32,
    counter: AtomicUsize,
}

impl WeightedRoundRobinLoadBalancer {
    pub fn new(weights: HashMap<String, u32>, default_weight: u32) -> Self {
        Self {
            weights,
            default_weight,
            counter: AtomicUsize::new(0),
        }
    }

    fn weight_of(&self, address: &str) -> usize {
        self.weights
            .get(address)
            .copied()
            .unwrap_or(self.default_weight) as usize
    }
}

impl Strategy for WeightedRoundRobinLoadBalancer {
    fn name(&self) -> &str {
        WEIGHTED_ROUND_ROBIN
    }
}

impl LoadBalancer for WeightedRoundRobinLoadBalancer {
    fn select(&self, candidates: &[String]) -> Option<usize> {
        let total: usize = candidates.iter().map(|c| self.weight_of(c)).sum();
        if total == 0 {
            return None;
        }
        let mut slot = self.counter.fetch_add(1, Ordering::Relaxed) % total;
        for (index, candidate) in candidates.iter().enumerate() {
            let weight = self.weight_of(candidate);
            if slot < weight {
                return Some(index);
            }
            slot -= weight;
        }
        None
    }
}

impl DefaultRegistry for dyn LoadBalancer {
    fn default_registry() -> StrategyRegistry<Self> {
        StrategyRegistry::new("load balancer")
            .with(ROUND_ROBIN, || {
                Ok(Arc::new(RoundRobinLoadBalancer::new()) as Arc<dyn LoadBalancer>)
            })
            .with(RANDOM, || Ok(Arc::new(RandomLoadBalancer) as Arc<dyn LoadBalancer>))
            .with(WEIGHTED_ROUND_ROBIN, || {
                Err(ClientError::UnsupportedStrategy {
                    kind: "load balancer",
                    key: WEIGHTED_ROUND_ROBIN.to_string(),
                    reason: "per-node weights are required; register a WeightedRoundRobinLoadBalancer factory in code".to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("redis://10.0.0.{i}:6379")).collect()
    }

    #[test]
    fn test_round_robin_cycles() {
        let balancer = RoundRobinLoadBalancer::new();
        let candidates = nodes(3);
        let picks: Vec<_> = (0..6).filter_map(|_| balancer.select(&candidates)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(balancer.select(&[]), None);
    }

    #[test]
    fn test_random_stays_in_range() {
        let candidates = nodes(4);
        for _ in 0..100 {
            let pick = RandomLoadBalancer.select(&candidates).unwrap();
            assert!(pick < 4);
        }
    }

    #[test]
    fn test_weighted_round_robin_honours_weights() {
        let candidates = nodes(2);
        let weights = HashMap::from([(candidates[0].clone(), 2)]);
        let balancer = WeightedRoundRobinLoadBalancer::new(weights, 1);
        let picks: Vec<_> = (0..6).filter_map(|_| balancer.select(&candidates)).collect();
        assert_eq!(picks, vec![0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_weighted_key_cannot_be_built_from_configuration() {
        let err = <dyn LoadBalancer>::default_registry()
            .create("WEIGHTED_ROUND_ROBIN")
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedStrategy { .. }));
    }
}
