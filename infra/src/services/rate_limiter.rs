//! Redis-based sliding-window rate limiter
//!
//! Admissions are members of a sorted set scored by the Redis server clock.
//! Pruning, counting, admitting and computing the retry delay happen in one
//! script, so callers on different instances are each counted exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use redis::Script;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use roomly_core::errors::DomainError;
use roomly_core::services::rate_limit::{RateLimitDecision, RateLimiter};
use roomly_shared::RateLimitPolicy;

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

// Returns {1, remaining} when admitted, {0, retry_after_ms} when limited
const SLIDING_WINDOW_SCRIPT: &str = r#"
local time = redis.call('TIME')
local now = tonumber(time[1]) * 1000 + math.floor(tonumber(time[2]) / 1000)
local window = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])

redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)
local count = redis.call('ZCARD', KEYS[1])

if count < limit then
    redis.call('ZADD', KEYS[1], now, ARGV[3])
    redis.call('PEXPIRE', KEYS[1], window)
    return {1, limit - count - 1}
end

local retry = window
local oldest = redis.call('ZRANGE', KEYS[1], 0, 0, 'WITHSCORES')
if oldest[2] then
    retry = tonumber(oldest[2]) + window - now
end
if retry < 1 then
    retry = 1
end
return {0, retry}
"#;

/// Rate limiter shared by every service instance
pub struct RedisRateLimiter {
    client: Arc<RedisClient>,
    policy: RateLimitPolicy,
    script: Script,
}

impl RedisRateLimiter {
    pub fn new(client: Arc<RedisClient>, policy: RateLimitPolicy) -> Self {
        Self {
            client,
            policy,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    fn window_key(&self, key: &str) -> String {
        self.client.make_key(&window_key_suffix(key))
    }
}

/// Limiter keys embed client addresses and identifiers, so only a digest is stored
pub(crate) fn window_key_suffix(key: &str) -> String {
    format!("ratelimit:{}", hex::encode(Sha256::digest(key.as_bytes())))
}

pub(crate) fn decision_from_reply(reply: &[i64]) -> Result<RateLimitDecision, InfrastructureError> {
    match reply {
        [1, remaining] => Ok(RateLimitDecision::Allowed {
            remaining: (*remaining).max(0) as u32,
        }),
        [0, retry_after_ms] => Ok(RateLimitDecision::Limited {
            retry_after_ms: (*retry_after_ms).max(1) as u64,
        }),
        other => Err(InfrastructureError::Corrupt(format!(
            "unexpected rate limiter reply: {:?}",
            other
        ))),
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn consume(&self, key: &str) -> Result<RateLimitDecision, DomainError> {
        let mut conn = self.client.connection();
        let reply: Vec<i64> = self
            .script
            .key(self.window_key(key))
            .arg(self.policy.window_millis())
            .arg(self.policy.max_points)
            .arg(Uuid::new_v4().to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        Ok(decision_from_reply(&reply)?)
    }
}
