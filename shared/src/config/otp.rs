//! OTP configuration module

use serde::{Deserialize, Serialize};

use super::{env_or, Environment};

/// Longest code lifetime accepted from configuration
pub const MAX_TTL_SECONDS: i64 = 300;

/// Highest per-code attempt budget accepted from configuration
pub const MAX_ATTEMPTS_LIMIT: u32 = 3;

/// Where OTP records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; records vanish on restart
    #[default]
    Memory,
    /// Redis hashes with key expiry
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" | "local" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(format!("Invalid OTP store backend: {}", s)),
        }
    }
}

/// OTP issuance and verification settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Record storage
    #[serde(default)]
    pub store: StoreBackend,

    /// Seconds a code stays valid after issuance
    pub ttl_seconds: i64,

    /// Verification comparisons allowed per code
    pub max_attempts: u32,

    /// Country calling code (digits only) prefixed to bare 10-digit numbers
    pub default_country_code: String,

    /// Let the log transport print codes; ignored in production
    #[serde(default)]
    pub reveal_codes: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            ttl_seconds: 300,
            max_attempts: 3,
            default_country_code: String::from("1"),
            reveal_codes: false,
        }
    }
}

impl OtpConfig {
    /// Load from `OTP_STORE`, `OTP_TTL_SECONDS`, `OTP_MAX_ATTEMPTS`,
    /// `OTP_DEFAULT_COUNTRY_CODE` and `OTP_REVEAL_CODES`
    ///
    /// TTL is clamped to `1..=300` seconds and attempts to `1..=3`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_country_code = std::env::var("OTP_DEFAULT_COUNTRY_CODE")
            .map(|code| code.trim_start_matches('+').to_string())
            .unwrap_or(defaults.default_country_code);

        Self {
            store: env_or("OTP_STORE", defaults.store),
            ttl_seconds: env_or("OTP_TTL_SECONDS", defaults.ttl_seconds),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts),
            default_country_code,
            reveal_codes: env_or("OTP_REVEAL_CODES", defaults.reveal_codes),
        }
        .clamped()
    }

    /// Pull TTL and attempt budget back into their allowed ranges
    pub fn clamped(mut self) -> Self {
        self.ttl_seconds = self.ttl_seconds.clamp(1, MAX_TTL_SECONDS);
        self.max_attempts = self.max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT);
        self
    }

    /// Apply environment restrictions: production never reveals codes
    pub fn restrict_for(&mut self, environment: Environment) {
        if environment.is_production() {
            self.reveal_codes = false;
        }
    }
}
