//! Business services containing domain logic and use cases.

pub mod notification;
pub mod otp;
pub mod rate_limit;

// Re-export commonly used types
pub use notification::NotificationSender;
pub use otp::{
    IssueOutcome, IssueRequest, OtpManager, OtpManagerConfig, VerifyOutcome, VerifyRequest,
};
pub use rate_limit::{InMemoryRateLimiter, RateLimitDecision, RateLimiter};
