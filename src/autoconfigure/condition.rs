//! Startup conditions
//!
//! Each component is guarded by an ordered list of [`Condition`]s. A
//! condition answers match or no-match together with a reason that ends up
//! in the [`super::ConditionReport`].

use std::collections::HashSet;
use std::fmt;

use serde_json::Value;

use crate::autoconfigure::registry::{SingletonKind, SingletonRegistry};
use crate::config::{RedisProperties, TopologyType};

/// Compile-time capability, the equivalent of a library being on the classpath
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Client,
    Cache,
    Transaction,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Client => "client",
            Feature::Cache => "cache",
            Feature::Transaction => "transaction",
        }
    }

    /// Whether the Cargo feature was compiled in
    pub fn is_compiled(&self) -> bool {
        match self {
            Feature::Client => cfg!(feature = "client"),
            Feature::Cache => cfg!(feature = "cache"),
            Feature::Transaction => cfg!(feature = "transaction"),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub matched: bool,
    pub reason: String,
}

impl ConditionOutcome {
    pub fn matched(reason: impl Into<String>) -> Self {
        Self {
            matched: true,
            reason: reason.into(),
        }
    }

    pub fn no_match(reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            reason: reason.into(),
        }
    }
}

/// Read-only view of properties keyed by dotted path
///
/// Keys match relaxed: case is ignored and `-` equals `_`, so
/// `redis.cache-manager.enabled` finds `redis.cache_manager.enabled`.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    root: Value,
}

impl PropertySource {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Bound `[redis]` section under the `redis` root key
    pub fn from_redis_properties(properties: &RedisProperties) -> Self {
        let section = serde_json::to_value(properties).unwrap_or(Value::Null);
        let mut root = serde_json::Map::new();
        root.insert("redis".to_string(), section);
        Self::new(Value::Object(root))
    }

    /// Scalar at `key`, rendered as a string; `None` when absent or null
    pub fn get(&self, key: &str) -> Option<String> {
        let mut current = &self.root;
        for segment in key.split('.') {
            let wanted = normalize_key(segment);
            current = current
                .as_object()?
                .iter()
                .find(|(name, _)| normalize_key(name) == wanted)
                .map(|(_, value)| value)?;
        }
        match current {
            Value::Null | Value::Object(_) | Value::Array(_) => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

/// Everything a condition may look at
pub struct ConditionContext<'a> {
    pub properties: &'a RedisProperties,
    pub source: &'a PropertySource,
    pub registry: &'a SingletonRegistry,
    pub excluded: &'a HashSet<Feature>,
}

pub trait Condition: Send + Sync {
    /// Short label used in the report, e.g. `OnProperty(redis.transaction.enabled=true)`
    fn describe(&self) -> String;

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome;
}

/// Feature compiled in and not excluded at runtime
#[derive(Debug, Clone, Copy)]
pub struct OnFeature(pub Feature);

impl Condition for OnFeature {
    fn describe(&self) -> String {
        format!("OnFeature({})", self.0)
    }

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        if !self.0.is_compiled() {
            return ConditionOutcome::no_match(format!("feature '{}' is not compiled in", self.0));
        }
        if context.excluded.contains(&self.0) {
            return ConditionOutcome::no_match(format!("feature '{}' is excluded", self.0));
        }
        ConditionOutcome::matched(format!("feature '{}' is available", self.0))
    }
}

/// Property present and equal to `having_value`
///
/// Without `having_value` any value other than `false` matches. A missing
/// property matches only when `match_if_missing` is set.
#[derive(Debug, Clone)]
pub struct OnProperty {
    pub key: String,
    pub having_value: Option<String>,
    pub match_if_missing: bool,
}

impl OnProperty {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            having_value: None,
            match_if_missing: false,
        }
    }

    pub fn having_value(mut self, value: impl Into<String>) -> Self {
        self.having_value = Some(value.into());
        self
    }

    pub fn match_if_missing(mut self, match_if_missing: bool) -> Self {
        self.match_if_missing = match_if_missing;
        self
    }
}

impl Condition for OnProperty {
    fn describe(&self) -> String {
        match &self.having_value {
            Some(value) => format!("OnProperty({}={})", self.key, value),
            None => format!("OnProperty({})", self.key),
        }
    }

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        let Some(actual) = context.source.get(&self.key) else {
            return if self.match_if_missing {
                ConditionOutcome::matched(format!("'{}' is not set, matching if missing", self.key))
            } else {
                ConditionOutcome::no_match(format!("'{}' is not set", self.key))
            };
        };

        let matched = match &self.having_value {
            Some(expected) => actual.trim().eq_ignore_ascii_case(expected.trim()),
            None => !actual.trim().eq_ignore_ascii_case("false"),
        };
        if matched {
            ConditionOutcome::matched(format!("'{}' is '{}'", self.key, actual))
        } else {
            ConditionOutcome::no_match(format!("'{}' is '{}'", self.key, actual))
        }
    }
}

/// A singleton of the kind is already registered
#[derive(Debug, Clone, Copy)]
pub struct OnSingleton(pub SingletonKind);

impl Condition for OnSingleton {
    fn describe(&self) -> String {
        format!("OnSingleton({})", self.0)
    }

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        match context.registry.name_of(self.0) {
            Some(name) => ConditionOutcome::matched(format!("found {} '{}'", self.0, name)),
            None => ConditionOutcome::no_match(format!("no {} registered", self.0)),
        }
    }
}

/// No singleton of the kind is registered yet
#[derive(Debug, Clone, Copy)]
pub struct OnMissingSingleton(pub SingletonKind);

impl Condition for OnMissingSingleton {
    fn describe(&self) -> String {
        format!("OnMissingSingleton({})", self.0)
    }

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        match context.registry.name_of(self.0) {
            Some(name) => ConditionOutcome::no_match(format!("{} '{}' already registered", self.0, name)),
            None => ConditionOutcome::matched(format!("no {} registered", self.0)),
        }
    }
}

/// `redis.type` is not `none`
///
/// Unknown discriminators match so that the builder reports them.
#[derive(Debug, Clone, Copy)]
pub struct OnTopologyEnabled;

impl Condition for OnTopologyEnabled {
    fn describe(&self) -> String {
        "OnTopologyEnabled".to_string()
    }

    fn evaluate(&self, context: &ConditionContext<'_>) -> ConditionOutcome {
        let value = &context.properties.topology_type;
        if TopologyType::is_disabled(value) {
            ConditionOutcome::no_match("redis.type is 'none'")
        } else {
            ConditionOutcome::matched(format!("redis.type is '{value}'"))
        }
    }
}
