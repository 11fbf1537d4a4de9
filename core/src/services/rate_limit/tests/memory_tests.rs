//! Unit tests for the in-memory sliding-window limiter

use std::sync::Arc;
use std::time::Duration;

use roomly_shared::RateLimitPolicy;

use crate::services::rate_limit::{InMemoryRateLimiter, RateLimitDecision, RateLimiter};

fn limiter(max_points: u32, window_seconds: u64) -> InMemoryRateLimiter {
    InMemoryRateLimiter::new(RateLimitPolicy::new(max_points, window_seconds))
}

#[tokio::test(start_paused = true)]
async fn test_admits_up_to_budget() {
    let limiter = limiter(3, 900);

    assert_eq!(
        limiter.consume("issue:1.2.3.4:a@b.io").await.unwrap(),
        RateLimitDecision::Allowed { remaining: 2 }
    );
    assert_eq!(
        limiter.consume("issue:1.2.3.4:a@b.io").await.unwrap(),
        RateLimitDecision::Allowed { remaining: 1 }
    );
    assert_eq!(
        limiter.consume("issue:1.2.3.4:a@b.io").await.unwrap(),
        RateLimitDecision::Allowed { remaining: 0 }
    );

    let decision = limiter.consume("issue:1.2.3.4:a@b.io").await.unwrap();
    assert_eq!(
        decision,
        RateLimitDecision::Limited { retry_after_ms: 900_000 }
    );
    assert_eq!(decision.retry_after_seconds(), Some(900));
}

#[tokio::test(start_paused = true)]
async fn test_window_slides() {
    let limiter = limiter(2, 60);

    limiter.consume("k").await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;
    limiter.consume("k").await.unwrap();

    let decision = limiter.consume("k").await.unwrap();
    assert_eq!(decision, RateLimitDecision::Limited { retry_after_ms: 30_000 });

    // The first admission leaves the window, the second is still inside it
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(limiter.consume("k").await.unwrap().is_allowed());
    assert!(!limiter.consume("k").await.unwrap().is_allowed());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_requests_do_not_extend_the_window() {
    let limiter = limiter(1, 10);

    limiter.consume("k").await.unwrap();
    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!limiter.consume("k").await.unwrap().is_allowed());
    }

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(limiter.consume("k").await.unwrap().is_allowed());
}

#[tokio::test(start_paused = true)]
async fn test_keys_are_independent() {
    let limiter = limiter(1, 900);

    assert!(limiter.consume("issue:1.1.1.1:a@b.io").await.unwrap().is_allowed());
    assert!(limiter.consume("issue:2.2.2.2:a@b.io").await.unwrap().is_allowed());
    assert!(!limiter.consume("issue:1.1.1.1:a@b.io").await.unwrap().is_allowed());
}

#[tokio::test]
async fn test_concurrent_callers_are_counted_once() {
    let limiter = Arc::new(limiter(5, 900));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.consume("shared").await })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_allowed() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}

#[test]
fn test_retry_after_rounds_up() {
    assert_eq!(
        RateLimitDecision::Limited { retry_after_ms: 1 }.retry_after_seconds(),
        Some(1)
    );
    assert_eq!(
        RateLimitDecision::Limited { retry_after_ms: 1_001 }.retry_after_seconds(),
        Some(2)
    );
    assert_eq!(
        RateLimitDecision::Allowed { remaining: 1 }.retry_after_seconds(),
        None
    );
}
