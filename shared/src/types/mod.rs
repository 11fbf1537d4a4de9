//! Type definitions shared by the API layer
//!
//! - `response` - success envelopes and health checks

pub mod response;

pub use response::{HealthResponse, SuccessResponse};
