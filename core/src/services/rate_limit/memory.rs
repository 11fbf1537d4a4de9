//! Process-local sliding-window rate limiter

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use roomly_shared::RateLimitPolicy;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::errors::DomainError;

use super::traits::{RateLimitDecision, RateLimiter};

// Sweep idle keys once the map grows past this many entries
const SWEEP_THRESHOLD: usize = 10_000;

/// In-memory limiter keeping the admission instants of each key
///
/// Uses `tokio::time::Instant` so paused test clocks drive the window.
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.policy.window_seconds)
    }
}

fn prune(admitted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = admitted.front() {
        if now.duration_since(*oldest) >= window {
            admitted.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn consume(&self, key: &str) -> Result<RateLimitDecision, DomainError> {
        let now = Instant::now();
        let window = self.window();
        let max_points = self.policy.max_points as usize;

        let mut windows = self.windows.lock().await;
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, admitted| {
                prune(admitted, now, window);
                !admitted.is_empty()
            });
        }

        let admitted = windows.entry(key.to_string()).or_default();
        prune(admitted, now, window);

        if admitted.len() < max_points {
            admitted.push_back(now);
            return Ok(RateLimitDecision::Allowed {
                remaining: (max_points - admitted.len()) as u32,
            });
        }

        let wait = match admitted.front() {
            Some(oldest) => window.saturating_sub(now.duration_since(*oldest)),
            None => window,
        };
        Ok(RateLimitDecision::Limited {
            retry_after_ms: (wait.as_millis() as u64).max(1),
        })
    }
}
