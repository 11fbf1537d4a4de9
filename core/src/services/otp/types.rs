//! Request and result types for the OTP manager

use crate::domain::entities::otp_record::{Channel, Purpose};

/// Input to [`OtpManager::issue`](super::OtpManager::issue)
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Raw identifier as submitted
    pub identifier: String,
    /// Explicit channel; inferred from the identifier when absent
    pub channel: Option<Channel>,
    pub purpose: Purpose,
    /// Caller address used to key the rate limiter
    pub client_address: String,
}

/// Input to [`OtpManager::verify`](super::OtpManager::verify)
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub identifier: String,
    pub channel: Option<Channel>,
    pub purpose: Purpose,
    /// Code as submitted
    pub code: String,
    pub client_address: String,
}

/// Result of a successful issuance. Never carries the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOutcome {
    pub channel: Channel,
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Identifier rendered for display
    pub masked_identifier: String,
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Normalized identifier that proved possession
    pub identifier: String,
    pub channel: Channel,
    pub purpose: Purpose,
}
