//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

use super::env_or;

/// Sliding-window budget: at most `max_points` admissions per `window_seconds`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimitPolicy {
    /// Admissions allowed inside one window
    pub max_points: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

impl RateLimitPolicy {
    pub const fn new(max_points: u32, window_seconds: u64) -> Self {
        Self {
            max_points,
            window_seconds,
        }
    }

    /// Window length in milliseconds
    pub fn window_millis(&self) -> u64 {
        self.window_seconds.saturating_mul(1000)
    }
}

/// Where limiter counters live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimiterBackend {
    /// Process-local counters; correct for a single instance only
    #[default]
    Memory,
    /// Shared counters in Redis
    Redis,
}

impl std::str::FromStr for LimiterBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "local" => Ok(LimiterBackend::Memory),
            "redis" => Ok(LimiterBackend::Redis),
            _ => Err(format!("Invalid rate limiter backend: {}", s)),
        }
    }
}

/// Rate limiting configuration for the OTP endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Counter storage
    #[serde(default)]
    pub backend: LimiterBackend,

    /// Issuance budget per (client address, identifier)
    pub issue: RateLimitPolicy,

    /// Verification budget per (client address, identifier)
    pub verify: RateLimitPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            backend: LimiterBackend::Memory,
            issue: RateLimitPolicy::new(3, 15 * 60),
            verify: RateLimitPolicy::new(5, 15 * 60),
        }
    }
}

impl RateLimitConfig {
    /// Load overrides from `RATE_LIMIT_BACKEND`, `OTP_ISSUE_MAX`,
    /// `OTP_ISSUE_WINDOW_SECONDS`, `OTP_VERIFY_MAX` and `OTP_VERIFY_WINDOW_SECONDS`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env_or("RATE_LIMIT_BACKEND", defaults.backend),
            issue: RateLimitPolicy::new(
                env_or("OTP_ISSUE_MAX", defaults.issue.max_points),
                env_or("OTP_ISSUE_WINDOW_SECONDS", defaults.issue.window_seconds),
            ),
            verify: RateLimitPolicy::new(
                env_or("OTP_VERIFY_MAX", defaults.verify.max_points),
                env_or("OTP_VERIFY_WINDOW_SECONDS", defaults.verify.window_seconds),
            ),
        }
    }
}
