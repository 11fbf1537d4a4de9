//! Sliding-window rate limiting
//!
//! The limiter is an injected capability. The process-local implementation
//! lives here; a shared Redis-backed one lives in the infra crate.

mod memory;
mod traits;

#[cfg(test)]
mod tests;

pub use memory::InMemoryRateLimiter;
pub use traits::{RateLimitDecision, RateLimiter};
