//! Rate limiter trait

use async_trait::async_trait;

use crate::errors::DomainError;

/// Result of consuming one point from a limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The point was admitted; `remaining` more fit in the current window
    Allowed { remaining: u32 },
    /// Over budget; the oldest admitted point leaves the window after `retry_after_ms`
    Limited { retry_after_ms: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }

    /// Whole seconds to wait, rounded up and never below one
    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            RateLimitDecision::Allowed { .. } => None,
            RateLimitDecision::Limited { retry_after_ms } => {
                Some(retry_after_ms.div_ceil(1000).max(1))
            }
        }
    }
}

/// Sliding-window limiter keyed by an arbitrary string
///
/// `consume` must count concurrent callers on the same key exactly once each.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Try to admit one request for `key`
    async fn consume(&self, key: &str) -> Result<RateLimitDecision, DomainError>;
}
