//! Domain-specific error types and error handling.

mod types;


pub use types::OtpError;

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// The backing store could not be reached or returned garbage
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage {
            message: message.into(),
        }
    }

    /// The OTP error inside, if this is one
    pub fn as_otp(&self) -> Option<&OtpError> {
        match self {
            DomainError::Otp(err) => Some(err),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
