//! Shared error response envelope

use serde::{Deserialize, Serialize};

/// Error body returned by every API endpoint
///
/// ```json
/// { "success": false, "error": "RATE_LIMITED", "message": "...", "retryAfter": 42 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Error code for client identification
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Seconds until the caller may try again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    /// Verification comparisons left on the current code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_attempts: Option<u32>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            retry_after: None,
            remaining_attempts: None,
        }
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn with_remaining_attempts(mut self, remaining: u32) -> Self {
        self.remaining_attempts = Some(remaining);
        self
    }
}

/// Error codes used across the application
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const OTP_NOT_FOUND_OR_EXPIRED: &str = "OTP_NOT_FOUND_OR_EXPIRED";
    pub const OTP_ATTEMPTS_EXCEEDED: &str = "OTP_ATTEMPTS_EXCEEDED";
    pub const OTP_INVALID: &str = "OTP_INVALID";
    pub const DELIVERY_FAILURE: &str = "DELIVERY_FAILURE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
}
