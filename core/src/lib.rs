//! # Roomly Core
//!
//! Core business logic and domain layer for the Roomly OTP service.
//! This crate contains the OTP record entity, the identifier value object,
//! repository and service traits, the OTP manager, and error types.
//! Process-local store and rate limiter implementations live here too;
//! shared (Redis) ones live in the infra crate.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::{Channel, Identifier, OtpKey, OtpRecord, Purpose};
pub use errors::{DomainError, DomainResult, OtpError};
pub use repositories::{AttemptSlot, InMemoryOtpRepository, OtpRepository};
pub use services::{
    InMemoryRateLimiter, IssueOutcome, IssueRequest, NotificationSender, OtpManager,
    OtpManagerConfig, RateLimitDecision, RateLimiter, VerifyOutcome, VerifyRequest,
};
