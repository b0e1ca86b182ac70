//! Startup orchestration
//!
//! [`AutoConfiguration`] evaluates the conditions of each component in a
//! fixed order (client, cache manager, transaction manager), builds what
//! matched and registers it in a [`SingletonRegistry`]. Every decision is
//! recorded in a [`ConditionReport`].
//!
//! Exactly one cache manager is registered: the composite with a no-op
//! fallback under [`CACHE_MANAGER`] when `fallback_to_no_op_cache` is on,
//! otherwise the Redis manager under [`REDIS_CACHE_MANAGER`], marked primary.

pub mod condition;
pub mod registry;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{
    CacheManager, CacheManagerCustomizer, CompositeCacheManager, create_cache_manager,
};
use crate::client::{ClientConfigBuilder, ClientConfigCustomizer, RedisClient};
use crate::config::RedisProperties;
use crate::error::AutoconfigError;
use crate::transaction::RedisTransactionManager;

pub use condition::{
    Condition, ConditionContext, ConditionOutcome, Feature, OnFeature, OnMissingSingleton,
    OnProperty, OnSingleton, OnTopologyEnabled, PropertySource,
};
pub use registry::{Singleton, SingletonKind, SingletonRegistry};

pub const REDIS_CLIENT: &str = "redis_client";

/// Name a default cache manager would be registered under
pub const CACHE_MANAGER: &str = "cache_manager";

pub const REDIS_CACHE_MANAGER: &str = "redis_cache_manager";

pub const REDIS_TRANSACTION_MANAGER: &str = "redis_transaction_manager";

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConditionEvaluation {
    pub condition: String,
    pub outcome: ConditionOutcome,
}

/// Conditions evaluated for one component, up to the first no-match
#[derive(Debug, Clone)]
pub struct ComponentReport {
    pub component: &'static str,
    pub evaluations: Vec<ConditionEvaluation>,
}

impl ComponentReport {
    pub fn matched(&self) -> bool {
        self.evaluations.iter().all(|e| e.outcome.matched)
    }

    /// Reason of the condition that stopped the component
    pub fn rejection(&self) -> Option<&str> {
        self.evaluations
            .iter()
            .find(|e| !e.outcome.matched)
            .map(|e| e.outcome.reason.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConditionReport {
    components: Vec<ComponentReport>,
}

impl ConditionReport {
    pub fn components(&self) -> &[ComponentReport] {
        &self.components
    }

    pub fn component(&self, component: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.component == component)
    }

    pub fn is_matched(&self, component: &str) -> bool {
        self.component(component).is_some_and(ComponentReport::matched)
    }
}

impl fmt::Display for ConditionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            let status = if component.matched() { "MATCHED" } else { "SKIPPED" };
            writeln!(f, "{} [{}]", component.component, status)?;
            for evaluation in &component.evaluations {
                let mark = if evaluation.outcome.matched { '+' } else { '-' };
                writeln!(
                    f,
                    "  {} {}: {}",
                    mark, evaluation.condition, evaluation.outcome.reason
                )?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct AutoConfiguration {
    properties: RedisProperties,
    source: PropertySource,
    builder: ClientConfigBuilder,
    cache_manager_customizers: Vec<Arc<dyn CacheManagerCustomizer>>,
    excluded: HashSet<Feature>,
}

impl AutoConfiguration {
    pub fn new(properties: RedisProperties) -> Self {
        let source = PropertySource::from_redis_properties(&properties);
        Self {
            properties,
            source,
            builder: ClientConfigBuilder::new(),
            cache_manager_customizers: Vec::new(),
            excluded: HashSet::new(),
        }
    }

    /// Use a builder carrying custom strategies or customizers
    pub fn with_builder(mut self, builder: ClientConfigBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_customizer<C>(mut self, customizer: C) -> Self
    where
        C: ClientConfigCustomizer + 'static,
    {
        self.builder.add_customizer(Arc::new(customizer));
        self
    }

    /// Adjust the cache manager after it is built from properties
    pub fn with_cache_manager_customizer<C>(mut self, customizer: C) -> Self
    where
        C: CacheManagerCustomizer + 'static,
    {
        self.cache_manager_customizers.push(Arc::new(customizer));
        self
    }

    /// Switch a compiled-in feature off for this run
    pub fn exclude(mut self, feature: Feature) -> Self {
        self.excluded.insert(feature);
        self
    }

    pub fn properties(&self) -> &RedisProperties {
        &self.properties
    }

    pub fn builder(&self) -> &ClientConfigBuilder {
        &self.builder
    }

    /// Run against an empty registry
    pub fn run(&self) -> Result<(SingletonRegistry, ConditionReport), AutoconfigError> {
        let mut registry = SingletonRegistry::new();
        let report = self.configure(&mut registry)?;
        Ok((registry, report))
    }

    /// Run against a registry that may already hold user singletons
    pub fn configure(
        &self,
        registry: &mut SingletonRegistry,
    ) -> Result<ConditionReport, AutoconfigError> {
        let mut report = ConditionReport::default();

        if self.evaluate(&mut report, "client", registry, &client_conditions()) {
            let config = self.builder.build(&self.properties)?;
            let client = Arc::new(RedisClient::new(config)?);
            registry.register_client(REDIS_CLIENT, client)?;
        }

        if self.evaluate(&mut report, "cache_manager", registry, &cache_manager_conditions())
            && let Some(client) = registry.client()
        {
            self.register_cache_manager(registry, client)?;
        }

        if self.evaluate(
            &mut report,
            "transaction_manager",
            registry,
            &transaction_manager_conditions(),
        ) && let Some(client) = registry.client()
        {
            let manager = RedisTransactionManager::new(client)?;
            registry.register(
                REDIS_TRANSACTION_MANAGER,
                Singleton::TransactionManager(Arc::new(manager)),
            )?;
        }

        Ok(report)
    }

    fn register_cache_manager(
        &self,
        registry: &mut SingletonRegistry,
        client: Arc<RedisClient>,
    ) -> Result<(), AutoconfigError> {
        let properties = &self.properties.cache_manager;
        let mut manager = create_cache_manager(client, properties, self.builder.codecs())?;
        for customizer in &self.cache_manager_customizers {
            customizer.customize(&mut manager)?;
        }

        if manager.properties().fallback_to_no_op_cache {
            let composite: Arc<dyn CacheManager> =
                Arc::new(CompositeCacheManager::with_fallback(Arc::new(manager)));
            registry.register(CACHE_MANAGER, Singleton::CacheManager(composite))?;
            registry.set_primary_cache_manager(CACHE_MANAGER);
        } else {
            registry.register(REDIS_CACHE_MANAGER, Singleton::CacheManager(Arc::new(manager)))?;
            registry.set_primary_cache_manager(REDIS_CACHE_MANAGER);
        }
        Ok(())
    }

    /// Evaluate in order, stopping at the first no-match
    fn evaluate(
        &self,
        report: &mut ConditionReport,
        component: &'static str,
        registry: &SingletonRegistry,
        conditions: &[Box<dyn Condition>],
    ) -> bool {
        let context = ConditionContext {
            properties: &self.properties,
            source: &self.source,
            registry,
            excluded: &self.excluded,
        };

        let mut evaluations = Vec::with_capacity(conditions.len());
        let mut matched = true;
        for condition in conditions {
            let outcome = condition.evaluate(&context);
            debug!(
                component,
                condition = %condition.describe(),
                matched = outcome.matched,
                reason = %outcome.reason,
                "Evaluated condition"
            );
            matched = outcome.matched;
            evaluations.push(ConditionEvaluation {
                condition: condition.describe(),
                outcome,
            });
            if !matched {
                break;
            }
        }

        if !matched {
            info!(component, "Skipping autoconfiguration");
        }
        report.components.push(ComponentReport {
            component,
            evaluations,
        });
        matched
    }
}

fn client_conditions() -> Vec<Box<dyn Condition>> {
    vec![
        Box::new(OnFeature(Feature::Client)),
        Box::new(OnTopologyEnabled),
        Box::new(OnMissingSingleton(SingletonKind::Client)),
    ]
}

fn cache_manager_conditions() -> Vec<Box<dyn Condition>> {
    vec![
        Box::new(OnFeature(Feature::Cache)),
        Box::new(OnSingleton(SingletonKind::Client)),
        Box::new(
            OnProperty::new("redis.cache_manager.enabled")
                .having_value("true")
                .match_if_missing(true),
        ),
        Box::new(OnMissingSingleton(SingletonKind::CacheManager)),
    ]
}

fn transaction_manager_conditions() -> Vec<Box<dyn Condition>> {
    vec![
        Box::new(OnFeature(Feature::Transaction)),
        Box::new(OnSingleton(SingletonKind::Client)),
        Box::new(
            OnProperty::new("redis.transaction.enabled")
                .having_value("true")
                .match_if_missing(false),
        ),
        Box::new(OnMissingSingleton(SingletonKind::TransactionManager)),
    ]
}
