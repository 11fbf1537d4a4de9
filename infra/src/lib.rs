//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the Roomly OTP service,
//! following Clean Architecture principles. It provides concrete
//! implementations of the capability traits declared in `roomly_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client and the Redis-backed OTP store
//! - **Services**: Redis sliding-window rate limiter
//! - **Notification**: SMTP email, Twilio SMS and log transports behind a dispatcher

use roomly_core::DomainError;

/// Cache module - Redis client and OTP store
pub mod cache;

/// Notification module - Email and SMS delivery
pub mod notification;

/// Services module - Infrastructure service implementations
pub mod services;

pub use cache::{RedisClient, RedisOtpRepository};
pub use notification::{create_notification_dispatcher, NotificationDispatcher};
pub use services::RedisRateLimiter;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored data could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Email or SMS provider rejected the message
    #[error("Delivery error: {0}")]
    Delivery(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::Storage {
            message: err.to_string(),
        }
    }
}
