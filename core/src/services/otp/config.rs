//! Configuration for the OTP manager

use roomly_shared::OtpConfig;

use crate::domain::entities::otp_record::{DEFAULT_TTL_SECONDS, MAX_ATTEMPTS};

/// Configuration for the OTP manager
#[derive(Debug, Clone)]
pub struct OtpManagerConfig {
    /// Seconds a code stays valid after issuance
    pub ttl_seconds: i64,
    /// Verification comparisons allowed per code
    pub max_attempts: u32,
    /// Prefixed to bare 10-digit phone numbers
    pub default_country_code: String,
}

impl Default for OtpManagerConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            max_attempts: MAX_ATTEMPTS,
            default_country_code: "1".to_string(),
        }
    }
}

impl From<&OtpConfig> for OtpManagerConfig {
    fn from(config: &OtpConfig) -> Self {
        Self {
            ttl_seconds: config.ttl_seconds,
            max_attempts: config.max_attempts,
            default_country_code: config.default_country_code.clone(),
        }
    }
}
