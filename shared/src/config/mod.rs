//! Configuration module with business-specific sub-modules
//!
//! - `cache` - Redis connection settings
//! - `environment` - Environment detection and logging configuration
//! - `notification` - Email and SMS delivery providers
//! - `otp` - Code lifetime, attempt budget and record storage
//! - `rate_limit` - Issuance and verification budgets
//! - `server` - HTTP server and CORS configuration

pub mod cache;
pub mod environment;
pub mod notification;
pub mod otp;
pub mod rate_limit;
pub mod server;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use cache::CacheConfig;
pub use environment::{Environment, LoggingConfig};
pub use notification::{EmailProvider, NotificationConfig, SmsProvider, SmtpConfig, TwilioConfig};
pub use otp::{OtpConfig, StoreBackend};
pub use rate_limit::{LimiterBackend, RateLimitConfig, RateLimitPolicy};
pub use server::{CorsConfig, ServerConfig};

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub otp: OtpConfig,
    pub rate_limit: RateLimitConfig,
    pub notification: NotificationConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            server: ServerConfig::default(),
            cache: CacheConfig::default(),
            otp: OtpConfig::default(),
            rate_limit: RateLimitConfig::default(),
            notification: NotificationConfig::default(),
            cors: CorsConfig::development(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        let environment = Environment::from_env();

        let mut cors = CorsConfig::from_env();
        if cors.allowed_origins.is_empty() && environment.is_development() {
            cors = CorsConfig::development();
        }

        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            logging.level = level;
        }

        let mut otp = OtpConfig::from_env();
        otp.restrict_for(environment);

        Self {
            environment,
            server: ServerConfig::from_env(),
            cache: CacheConfig::from_env(),
            otp,
            rate_limit: RateLimitConfig::from_env(),
            notification: NotificationConfig::from_env(),
            cors,
            logging,
        }
    }

    /// Whether any component needs a Redis connection
    pub fn requires_redis(&self) -> bool {
        self.otp.store == StoreBackend::Redis || self.rate_limit.backend == LimiterBackend::Redis
    }
}

/// Parse an environment variable, falling back to `default` when unset or malformed
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
