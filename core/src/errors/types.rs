//! OTP-specific error types
//!
//! Variants carry only what a caller may see. Provider and store detail is
//! logged where it happens and never travels in these values.

use thiserror::Error;

/// Errors produced by code issuance and verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Too many requests, retry in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Verification code not found or expired")]
    NotFoundOrExpired,

    #[error("Maximum verification attempts exceeded")]
    AttemptsExceeded,

    #[error("Invalid verification code, {remaining_attempts} attempt(s) remaining")]
    InvalidCode { remaining_attempts: u32 },

    #[error("Failed to deliver verification code")]
    DeliveryFailure,
}

impl OtpError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        OtpError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
