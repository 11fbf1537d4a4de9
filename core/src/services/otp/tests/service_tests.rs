//! Unit tests for the OTP manager

use std::sync::Arc;

use chrono::{Duration, Utc};
use roomly_shared::RateLimitPolicy;

use crate::domain::entities::otp_record::{Channel, OtpKey, OtpRecord, Purpose, CODE_LENGTH};
use crate::errors::{DomainError, OtpError};
use crate::repositories::otp::{InMemoryOtpRepository, OtpRepository};
use crate::services::otp::{IssueRequest, OtpManager, OtpManagerConfig, VerifyRequest};
use crate::services::rate_limit::InMemoryRateLimiter;

use super::mocks::{CountingRateLimiter, MockNotificationSender, UnavailableOtpRepository};

const EMAIL: &str = "student@example.com";
const CLIENT: &str = "203.0.113.7";

type Limiter = CountingRateLimiter<InMemoryRateLimiter>;
type Manager = OtpManager<InMemoryOtpRepository, Limiter, MockNotificationSender>;

struct Harness {
    manager: Arc<Manager>,
    repository: Arc<InMemoryOtpRepository>,
    issue_limiter: Arc<Limiter>,
    verify_limiter: Arc<Limiter>,
    sender: Arc<MockNotificationSender>,
}

fn harness_with(issue: RateLimitPolicy, verify: RateLimitPolicy) -> Harness {
    let repository = Arc::new(InMemoryOtpRepository::new());
    let issue_limiter = Arc::new(CountingRateLimiter::new(InMemoryRateLimiter::new(issue)));
    let verify_limiter = Arc::new(CountingRateLimiter::new(InMemoryRateLimiter::new(verify)));
    let sender = Arc::new(MockNotificationSender::new(false));

    let manager = Arc::new(OtpManager::new(
        repository.clone(),
        issue_limiter.clone(),
        verify_limiter.clone(),
        sender.clone(),
        OtpManagerConfig::default(),
    ));

    Harness {
        manager,
        repository,
        issue_limiter,
        verify_limiter,
        sender,
    }
}

fn harness() -> Harness {
    harness_with(RateLimitPolicy::new(3, 900), RateLimitPolicy::new(5, 900))
}

fn issue_request(identifier: &str, purpose: Purpose) -> IssueRequest {
    IssueRequest {
        identifier: identifier.to_string(),
        channel: None,
        purpose,
        client_address: CLIENT.to_string(),
    }
}

fn verify_request(identifier: &str, purpose: Purpose, code: &str) -> VerifyRequest {
    VerifyRequest {
        identifier: identifier.to_string(),
        channel: None,
        purpose,
        code: code.to_string(),
        client_address: CLIENT.to_string(),
    }
}

fn otp_error(result: Result<impl std::fmt::Debug, DomainError>) -> OtpError {
    match result {
        Err(DomainError::Otp(err)) => err,
        other => panic!("expected an OTP error, got {:?}", other),
    }
}

fn email_key(purpose: Purpose) -> OtpKey {
    OtpKey::new(EMAIL, Channel::Email, purpose)
}

#[tokio::test]
async fn test_issue_then_verify_succeeds_once() {
    let h = harness();

    let outcome = h
        .manager
        .issue(issue_request(EMAIL, Purpose::Signup))
        .await
        .unwrap();
    assert_eq!(outcome.channel, Channel::Email);
    assert_eq!(outcome.expires_in, 300);
    assert_eq!(outcome.masked_identifier, "st***@example.com");

    let code = h.sender.last_code(EMAIL).unwrap();
    assert_eq!(code.len(), CODE_LENGTH);

    let verified = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Signup, &code))
        .await
        .unwrap();
    assert_eq!(verified.identifier, EMAIL);
    assert_eq!(verified.purpose, Purpose::Signup);

    let again = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Signup, &code))
        .await;
    assert_eq!(otp_error(again), OtpError::NotFoundOrExpired);
}

#[tokio::test]
async fn test_identifier_is_normalized_before_lookup() {
    let h = harness();
    h.manager
        .issue(issue_request("  Student@Example.COM ", Purpose::Login))
        .await
        .unwrap();

    let code = h.sender.last_code(EMAIL).unwrap();
    let result = h
        .manager
        .verify(verify_request("STUDENT@example.com", Purpose::Login, &code))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_three_wrong_codes_exhaust_the_record() {
    let h = harness();
    h.manager
        .issue(issue_request(EMAIL, Purpose::Login))
        .await
        .unwrap();
    let code = h.sender.last_code(EMAIL).unwrap();

    for remaining in [2, 1, 0] {
        let result = h
            .manager
            .verify(verify_request(EMAIL, Purpose::Login, "000000"))
            .await;
        assert_eq!(
            otp_error(result),
            OtpError::InvalidCode { remaining_attempts: remaining }
        );
    }

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Login, &code))
        .await;
    assert_eq!(otp_error(result), OtpError::AttemptsExceeded);

    let records = h.repository.records_for(&email_key(Purpose::Login)).await;
    assert_eq!(records[0].attempts, 3);
    assert!(!records[0].is_used);
}

#[tokio::test]
async fn test_new_issuance_supersedes_previous_code() {
    let h = harness();
    h.manager
        .issue(issue_request(EMAIL, Purpose::PasswordReset))
        .await
        .unwrap();
    let first = h.sender.last_code(EMAIL).unwrap();

    h.manager
        .issue(issue_request(EMAIL, Purpose::PasswordReset))
        .await
        .unwrap();
    let second = h.sender.last_code(EMAIL).unwrap();

    let records = h
        .repository
        .records_for(&email_key(Purpose::PasswordReset))
        .await;
    assert_eq!(records.len(), 2);
    assert!(records[0].is_used);
    assert!(!records[1].is_used);
    assert_eq!(records[1].generation, 2);

    if first != second {
        let result = h
            .manager
            .verify(verify_request(EMAIL, Purpose::PasswordReset, &first))
            .await;
        assert!(matches!(otp_error(result), OtpError::InvalidCode { .. }));
    }

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::PasswordReset, &second))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_expired_code_is_not_found() {
    let h = harness();
    let key = email_key(Purpose::Verification);
    let issued_at = Utc::now() - Duration::seconds(301);
    let record = OtpRecord::with_code(&key, "482913".to_string(), 300, issued_at);
    h.repository.issue(&record).await.unwrap();

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Verification, "482913"))
        .await;
    assert_eq!(otp_error(result), OtpError::NotFoundOrExpired);
}

#[tokio::test]
async fn test_wrong_then_right_code() {
    let h = harness();
    let before = Utc::now();
    h.manager
        .issue(issue_request(EMAIL, Purpose::Signup))
        .await
        .unwrap();

    let key = email_key(Purpose::Signup);
    let record = h.repository.records_for(&key).await.remove(0);
    assert_eq!(record.code.len(), 6);
    assert!(record.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(record.attempts, 0);
    assert!(!record.is_used);
    let lifetime = (record.expires_at - before).num_seconds();
    assert!((299..=301).contains(&lifetime));

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Signup, "000000"))
        .await;
    assert_eq!(
        otp_error(result),
        OtpError::InvalidCode { remaining_attempts: 2 }
    );
    assert_eq!(h.repository.records_for(&key).await[0].attempts, 1);

    h.manager
        .verify(verify_request(EMAIL, Purpose::Signup, &record.code))
        .await
        .unwrap();
    let stored = h.repository.records_for(&key).await;
    assert!(stored[0].is_used);
    assert_eq!(stored[0].attempts, 2);
}

#[tokio::test]
async fn test_fourth_issuance_is_rate_limited() {
    let h = harness();
    for _ in 0..3 {
        h.manager
            .issue(issue_request(EMAIL, Purpose::Login))
            .await
            .unwrap();
    }

    let result = h.manager.issue(issue_request(EMAIL, Purpose::Login)).await;
    match otp_error(result) {
        OtpError::RateLimited { retry_after_seconds } => {
            assert!(retry_after_seconds > 0);
            assert!(retry_after_seconds <= 900);
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

#[tokio::test]
async fn test_issuance_budget_is_per_client() {
    let h = harness();
    for _ in 0..3 {
        h.manager
            .issue(issue_request(EMAIL, Purpose::Login))
            .await
            .unwrap();
    }

    let mut other_client = issue_request(EMAIL, Purpose::Login);
    other_client.client_address = "198.51.100.20".to_string();
    assert!(h.manager.issue(other_client).await.is_ok());
}

#[tokio::test]
async fn test_malformed_identifier_touches_nothing() {
    let h = harness();

    let result = h
        .manager
        .issue(issue_request("not-an-email", Purpose::Signup))
        .await;
    assert!(matches!(otp_error(result), OtpError::Validation { .. }));

    let result = h
        .manager
        .verify(verify_request("not-an-email", Purpose::Signup, "123456"))
        .await;
    assert!(matches!(otp_error(result), OtpError::Validation { .. }));

    assert_eq!(h.issue_limiter.calls(), 0);
    assert_eq!(h.verify_limiter.calls(), 0);
    assert!(h.sender.sent.lock().unwrap().is_empty());
    assert_eq!(
        h.repository
            .purge_expired(Utc::now() + Duration::days(1))
            .await,
        0
    );
}

#[tokio::test]
async fn test_malformed_code_is_a_validation_error() {
    let h = harness();
    for code in ["12345", "1234567", "12a456", "", " 12345"] {
        let result = h
            .manager
            .verify(verify_request(EMAIL, Purpose::Signup, code))
            .await;
        match otp_error(result) {
            OtpError::Validation { field, .. } => assert_eq!(field, "code"),
            other => panic!("expected Validation, got {:?}", other),
        }
    }
    assert_eq!(h.verify_limiter.calls(), 0);
}

#[tokio::test]
async fn test_verification_is_rate_limited() {
    let h = harness();
    for _ in 0..5 {
        let result = h
            .manager
            .verify(verify_request(EMAIL, Purpose::Signup, "123456"))
            .await;
        assert_eq!(otp_error(result), OtpError::NotFoundOrExpired);
    }

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Signup, "123456"))
        .await;
    assert!(matches!(otp_error(result), OtpError::RateLimited { .. }));
}

#[tokio::test]
async fn test_purposes_do_not_share_codes() {
    let h = harness();
    h.manager
        .issue(issue_request(EMAIL, Purpose::Signup))
        .await
        .unwrap();
    let code = h.sender.last_code(EMAIL).unwrap();

    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Login, &code))
        .await;
    assert_eq!(otp_error(result), OtpError::NotFoundOrExpired);
}

#[tokio::test]
async fn test_phone_codes_go_out_by_sms() {
    let h = harness();
    let outcome = h
        .manager
        .issue(issue_request("415-555-2671", Purpose::Login))
        .await
        .unwrap();
    assert_eq!(outcome.channel, Channel::Phone);
    assert_eq!(outcome.masked_identifier, "+*******2671");

    let code = h.sender.last_code("+14155552671").unwrap();
    let result = h
        .manager
        .verify(verify_request("+1 (415) 555-2671", Purpose::Login, &code))
        .await
        .unwrap();
    assert_eq!(result.channel, Channel::Phone);
}

#[tokio::test]
async fn test_delivery_failure_keeps_record_verifiable() {
    let h = harness();
    h.sender.set_failing(true);

    let result = h.manager.issue(issue_request(EMAIL, Purpose::Signup)).await;
    assert_eq!(otp_error(result), OtpError::DeliveryFailure);

    let record = h
        .repository
        .records_for(&email_key(Purpose::Signup))
        .await
        .remove(0);
    let result = h
        .manager
        .verify(verify_request(EMAIL, Purpose::Signup, &record.code))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_storage_outage_surfaces_as_storage_error() {
    let manager = OtpManager::new(
        Arc::new(UnavailableOtpRepository),
        Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(3, 900))),
        Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(5, 900))),
        Arc::new(MockNotificationSender::new(false)),
        OtpManagerConfig::default(),
    );

    let result = manager.issue(issue_request(EMAIL, Purpose::Signup)).await;
    assert!(matches!(result, Err(DomainError::Storage { .. })));

    let result = manager
        .verify(verify_request(EMAIL, Purpose::Signup, "123456"))
        .await;
    assert!(matches!(result, Err(DomainError::Storage { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_wrong_codes_never_exceed_cap() {
    let h = harness_with(RateLimitPolicy::new(3, 900), RateLimitPolicy::new(100, 900));
    h.manager
        .issue(issue_request(EMAIL, Purpose::Login))
        .await
        .unwrap();

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let manager = h.manager.clone();
            tokio::spawn(async move {
                manager
                    .verify(verify_request(EMAIL, Purpose::Login, "000000"))
                    .await
            })
        })
        .collect();

    let mut invalid = 0;
    let mut exceeded = 0;
    for handle in handles {
        match otp_error(handle.await.unwrap()) {
            OtpError::InvalidCode { .. } => invalid += 1,
            OtpError::AttemptsExceeded => exceeded += 1,
            other => panic!("unexpected error {:?}", other),
        }
    }

    assert_eq!(invalid, 3);
    assert_eq!(exceeded, 9);
    let records = h.repository.records_for(&email_key(Purpose::Login)).await;
    assert_eq!(records[0].attempts, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuances_leave_one_active_record() {
    let h = harness();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let manager = h.manager.clone();
            tokio::spawn(async move { manager.issue(issue_request(EMAIL, Purpose::Signup)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = h.repository.records_for(&email_key(Purpose::Signup)).await;
    assert_eq!(records.len(), 3);
    assert_eq!(records.iter().filter(|r| !r.is_used).count(), 1);

    let active = h
        .repository
        .find_active(&email_key(Purpose::Signup), Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.generation, 3);
}

#[tokio::test]
async fn test_remaining_attempts_follow_configured_budget() {
    let sender = Arc::new(MockNotificationSender::new(false));
    let manager = OtpManager::new(
        Arc::new(InMemoryOtpRepository::new()),
        Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(3, 900))),
        Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(5, 900))),
        sender.clone(),
        OtpManagerConfig {
            max_attempts: 2,
            ..OtpManagerConfig::default()
        },
    );
    manager
        .issue(issue_request(EMAIL, Purpose::Login))
        .await
        .unwrap();
    let code = sender.last_code(EMAIL).unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for remaining in [1, 0] {
        let result = manager
            .verify(verify_request(EMAIL, Purpose::Login, wrong))
            .await;
        assert_eq!(
            otp_error(result),
            OtpError::InvalidCode {
                remaining_attempts: remaining
            }
        );
    }

    let result = manager
        .verify(verify_request(EMAIL, Purpose::Login, &code))
        .await;
    assert_eq!(otp_error(result), OtpError::AttemptsExceeded);
}
