//! OTP issuance and verification
//!
//! This module provides the complete one-time passcode workflow:
//! - identifier normalization and channel inference
//! - per-client sliding-window rate limiting
//! - code generation, supersession and delivery hand-off
//! - verification with a per-code attempt budget

mod config;
mod service;
mod types;

#[cfg(test)]
mod tests;

pub use config::OtpManagerConfig;
pub use service::OtpManager;
pub use types::{IssueOutcome, IssueRequest, VerifyOutcome, VerifyRequest};
