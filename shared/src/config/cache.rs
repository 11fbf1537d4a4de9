//! Cache configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Redis cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Redis connection URL
    pub url: String,

    /// Prefix applied to every key written by this service
    #[serde(default)]
    pub key_prefix: Option<String>,

    /// Connection attempts before start-up gives up
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Base delay between connection attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://localhost:6379"),
            key_prefix: Some(String::from("roomly")),
            connect_retries: default_connect_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: std::env::var("REDIS_KEY_PREFIX")
                .ok()
                .or(defaults.key_prefix),
            connect_retries: env_or("REDIS_CONNECT_RETRIES", defaults.connect_retries),
            retry_delay_ms: env_or("REDIS_RETRY_DELAY_MS", defaults.retry_delay_ms),
        }
    }

    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, key),
            _ => key.to_string(),
        }
    }
}

fn default_connect_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}
