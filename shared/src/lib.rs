//! Shared utilities and common types for the Roomly server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error and response envelopes
//! - Identifier utilities (email and phone normalization, masking)

pub mod config;
pub mod errors;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CorsConfig, EmailProvider, Environment, LimiterBackend,
    LoggingConfig, NotificationConfig, OtpConfig, RateLimitConfig, RateLimitPolicy,
    ServerConfig, SmsProvider, SmtpConfig, StoreBackend, TwilioConfig,
};
pub use errors::{error_codes, ErrorResponse};
pub use types::{HealthResponse, SuccessResponse};
pub use utils::{email, mask, phone};
