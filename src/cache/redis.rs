//! Redis cache implementation on top of [`RedisClient`].
//!
//! Key layout for cache `users` with prefix `app:`:
//! - `app:{users}:<key>` hash with fields `v` (payload) and `w` (write
//!   deadline in epoch ms, 0 when ttl is off)
//! - `app:{users}:__index` sorted set of entry keys scored by last access
//!
//! Index members whose entry has certainly expired (last access older than
//! the shorter of ttl and max-idle) are pruned on every write, so the index
//! only outgrows the live entries by what expired since the last put.
//!
//! The braces keep every key of one cache in the same cluster slot, so
//! the multi-key pipelines below also work against a cluster.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{Cache, CacheError, CacheValue};
use crate::client::RedisClient;
use crate::config::CachePolicy;

const NULL_MARKER: u8 = 0;
const VALUE_MARKER: u8 = 1;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn encode_payload(value: &Option<Vec<u8>>) -> Vec<u8> {
    match value {
        None => vec![NULL_MARKER],
        Some(bytes) => {
            let mut payload = Vec::with_capacity(bytes.len() + 1);
            payload.push(VALUE_MARKER);
            payload.extend_from_slice(bytes);
            payload
        }
    }
}

fn decode_payload(payload: &[u8]) -> Result<CacheValue, CacheError> {
    match payload.split_first() {
        Some((&NULL_MARKER, _)) => Ok(CacheValue::Null),
        Some((&VALUE_MARKER, bytes)) => Ok(CacheValue::Bytes(bytes.to_vec())),
        _ => Err(CacheError::Serialization(
            "unrecognised cache entry payload".to_string(),
        )),
    }
}

/// Milliseconds until the entry should expire, `None` for no expiry
fn expiry_millis(policy: &CachePolicy, write_deadline: u64, now: u64) -> Option<u64> {
    let ttl_left = (write_deadline > 0).then(|| write_deadline.saturating_sub(now).max(1));
    let idle = (policy.max_idle > 0).then_some(policy.max_idle);
    match (ttl_left, idle) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Index scores below this belong to expired entries, `None` without expiry
fn stale_before(policy: &CachePolicy, now: u64) -> Option<u64> {
    [policy.ttl, policy.max_idle]
        .into_iter()
        .filter(|&bound| bound > 0)
        .min()
        .map(|bound| now.saturating_sub(bound))
}

/// Redis-based cache
pub struct RedisCache {
    name: String,
    client: Arc<RedisClient>,
    policy: CachePolicy,
    allow_null_values: bool,
    namespace: String,
}

impl RedisCache {
    pub fn new(
        client: Arc<RedisClient>,
        name: impl Into<String>,
        policy: CachePolicy,
        allow_null_values: bool,
        key_prefix: Option<&str>,
    ) -> Self {
        let name = name.into();
        let namespace = format!("{}{{{}}}", key_prefix.unwrap_or_default(), name);
        Self {
            name,
            client,
            policy,
            allow_null_values,
            namespace,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn index_key(&self) -> String {
        format!("{}:__index", self.namespace)
    }

    /// Drop least recently used entries beyond `max_size`
    async fn enforce_max_size(&self) -> Result<(), CacheError> {
        let Some(max_size) = self.policy.max_size() else {
            return Ok(());
        };
        let index = self.index_key();
        let mut conn = self.client.connection().await?;

        let count: u64 = redis::cmd("ZCARD")
            .arg(&index)
            .query_async(&mut conn)
            .await?;
        if count <= max_size {
            return Ok(());
        }

        let victims: Vec<String> = redis::cmd("ZRANGE")
            .arg(&index)
            .arg(0)
            .arg(count - max_size - 1)
            .query_async(&mut conn)
            .await?;
        if victims.is_empty() {
            return Ok(());
        }
        debug!(cache = %self.name, evicted = victims.len(), "Evicting least recently used entries");

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(&victims)
            .ignore()
            .cmd("ZREM")
            .arg(&index)
            .arg(&victims)
            .ignore();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl Cache for RedisCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let entry_key = self.entry_key(key);
        let index = self.index_key();
        let mut conn = self.client.connection().await?;

        let (payload, write_deadline): (Option<Vec<u8>>, Option<u64>) = redis::cmd("HMGET")
            .arg(&entry_key)
            .arg("v")
            .arg("w")
            .query_async(&mut conn)
            .await?;

        let Some(payload) = payload else {
            let _: () = redis::cmd("ZREM")
                .arg(&index)
                .arg(&entry_key)
                .query_async(&mut conn)
                .await?;
            return Ok(None);
        };

        let now = now_millis();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZADD")
            .arg(&index)
            .arg(now)
            .arg(&entry_key)
            .ignore();
        if self.policy.max_idle > 0
            && let Some(px) = expiry_millis(&self.policy, write_deadline.unwrap_or(0), now)
        {
            pipe.cmd("PEXPIRE").arg(&entry_key).arg(px).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;

        decode_payload(&payload).map(Some)
    }

    async fn put(&self, key: &str, value: Option<Vec<u8>>) -> Result<(), CacheError> {
        if value.is_none() && !self.allow_null_values {
            return Err(CacheError::NullValueNotAllowed(self.name.clone()));
        }
        let entry_key = self.entry_key(key);
        let now = now_millis();
        let write_deadline = if self.policy.ttl > 0 {
            now + self.policy.ttl
        } else {
            0
        };

        let index = self.index_key();
        let mut pipe = redis::pipe();
        pipe.atomic();
        if let Some(cutoff) = stale_before(&self.policy, now) {
            pipe.cmd("ZREMRANGEBYSCORE")
                .arg(&index)
                .arg("-inf")
                .arg(format!("({cutoff}"))
                .ignore();
        }
        pipe.cmd("DEL")
            .arg(&entry_key)
            .ignore()
            .cmd("HSET")
            .arg(&entry_key)
            .arg("v")
            .arg(encode_payload(&value))
            .arg("w")
            .arg(write_deadline)
            .ignore()
            .cmd("ZADD")
            .arg(&index)
            .arg(now)
            .arg(&entry_key)
            .ignore();
        if let Some(px) = expiry_millis(&self.policy, write_deadline, now) {
            pipe.cmd("PEXPIRE").arg(&entry_key).arg(px).ignore();
        }

        {
            let mut conn = self.client.connection().await?;
            let _: () = pipe.query_async(&mut conn).await?;
        }
        self.enforce_max_size().await
    }

    async fn evict(&self, key: &str) -> Result<bool, CacheError> {
        let entry_key = self.entry_key(key);
        let mut conn = self.client.connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(&entry_key)
            .cmd("ZREM")
            .arg(self.index_key())
            .arg(&entry_key)
            .ignore();
        let (deleted,): (u64,) = pipe.query_async(&mut conn).await?;
        Ok(deleted > 0)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let index = self.index_key();
        let mut conn = self.client.connection().await?;
        let keys: Vec<String> = redis::cmd("ZRANGE")
            .arg(&index)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        if !keys.is_empty() {
            pipe.cmd("DEL").arg(&keys).ignore();
        }
        pipe.cmd("DEL").arg(&index).ignore();
        let _: () = pipe.query_async(&mut conn).await?;
        debug!(cache = %self.name, entries = keys.len(), "Cleared cache");
        Ok(())
    }
}
