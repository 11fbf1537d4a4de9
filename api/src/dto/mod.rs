//! Request and response bodies

pub mod error;
pub mod otp;

pub use error::{ErrorResponse, ErrorResponseExt};
pub use otp::{SendOtpRequest, VerifyOtpRequest};
