//! Main OTP manager implementation

use std::sync::Arc;

use chrono::Utc;
use constant_time_eq::constant_time_eq;

use crate::domain::entities::otp_record::{Channel, OtpKey, OtpRecord, CODE_LENGTH};
use crate::domain::value_objects::Identifier;
use crate::errors::{DomainResult, OtpError};
use crate::repositories::otp::{AttemptSlot, OtpRepository};
use crate::services::notification::NotificationSender;
use crate::services::rate_limit::{RateLimitDecision, RateLimiter};

use super::config::OtpManagerConfig;
use super::types::{IssueOutcome, IssueRequest, VerifyOutcome, VerifyRequest};

/// Issues and verifies one-time passcodes
///
/// Issuance and verification are rate limited separately; both limiters are
/// keyed by `<client address>:<normalized identifier>`.
pub struct OtpManager<R: OtpRepository, L: RateLimiter, N: NotificationSender> {
    /// Record store
    repository: Arc<R>,
    /// Budget for issuance requests
    issue_limiter: Arc<L>,
    /// Budget for verification requests
    verify_limiter: Arc<L>,
    /// Email and SMS delivery
    sender: Arc<N>,
    config: OtpManagerConfig,
}

impl<R: OtpRepository, L: RateLimiter, N: NotificationSender> OtpManager<R, L, N> {
    pub fn new(
        repository: Arc<R>,
        issue_limiter: Arc<L>,
        verify_limiter: Arc<L>,
        sender: Arc<N>,
        config: OtpManagerConfig,
    ) -> Self {
        Self {
            repository,
            issue_limiter,
            verify_limiter,
            sender,
            config,
        }
    }

    pub fn config(&self) -> &OtpManagerConfig {
        &self.config
    }

    /// Issue a new code and hand it to the notification sender
    ///
    /// 1. Parses the identifier (validation happens before anything is touched)
    /// 2. Consumes one point from the issuance limiter
    /// 3. Stores a fresh record, superseding every earlier one for the key
    /// 4. Sends the code over the identifier's channel
    ///
    /// A delivery failure leaves the stored record in place.
    pub async fn issue(&self, request: IssueRequest) -> DomainResult<IssueOutcome> {
        let identifier = self.parse_identifier(&request.identifier, request.channel)?;
        let masked = identifier.masked();

        let limiter_key = format!("issue:{}:{}", request.client_address, identifier.as_str());
        self.check_rate_limit(self.issue_limiter.as_ref(), &limiter_key, &masked, "issue")
            .await?;

        let key = OtpKey::new(identifier.as_str(), identifier.channel(), request.purpose);
        let record = OtpRecord::issue(&key, self.config.ttl_seconds, Utc::now());
        let generation = self.repository.issue(&record).await?;

        tracing::info!(
            identifier = %masked,
            channel = %key.channel,
            purpose = %key.purpose,
            generation = generation,
            event = "otp_issued",
            "Issued verification code"
        );

        let delivery = match key.channel {
            Channel::Email => {
                self.sender
                    .send_email(&key.identifier, &record.code, key.purpose)
                    .await
            }
            Channel::Phone => {
                self.sender
                    .send_sms(&key.identifier, &record.code, key.purpose)
                    .await
            }
        };

        match delivery {
            Ok(message_id) => {
                tracing::info!(
                    identifier = %masked,
                    channel = %key.channel,
                    message_id = %message_id,
                    event = "otp_delivered",
                    "Verification code handed to provider"
                );
            }
            Err(e) => {
                tracing::error!(
                    identifier = %masked,
                    channel = %key.channel,
                    error = %e,
                    event = "otp_delivery_failed",
                    "Failed to deliver verification code"
                );
                return Err(OtpError::DeliveryFailure.into());
            }
        }

        Ok(IssueOutcome {
            channel: key.channel,
            expires_in: self.config.ttl_seconds,
            masked_identifier: masked,
        })
    }

    /// Check a submitted code against the active record
    ///
    /// Every call that reaches a live record consumes one attempt, whether the
    /// code matches or not. A successful verification consumes the record.
    pub async fn verify(&self, request: VerifyRequest) -> DomainResult<VerifyOutcome> {
        let identifier = self.parse_identifier(&request.identifier, request.channel)?;
        validate_code(&request.code)?;
        let masked = identifier.masked();

        let limiter_key = format!("verify:{}:{}", request.client_address, identifier.as_str());
        self.check_rate_limit(self.verify_limiter.as_ref(), &limiter_key, &masked, "verify")
            .await?;

        let key = OtpKey::new(identifier.as_str(), identifier.channel(), request.purpose);
        let now = Utc::now();

        let Some(mut record) = self.repository.find_active(&key, now).await? else {
            tracing::info!(
                identifier = %masked,
                purpose = %key.purpose,
                event = "otp_not_found",
                "No active verification code"
            );
            return Err(OtpError::NotFoundOrExpired.into());
        };

        if record.remaining_attempts(self.config.max_attempts) == 0 {
            tracing::warn!(
                identifier = %masked,
                event = "otp_attempts_exceeded",
                "Verification attempt on exhausted code"
            );
            return Err(OtpError::AttemptsExceeded.into());
        }

        record.attempts = match self
            .repository
            .consume_attempt(&key, record.id, self.config.max_attempts, now)
            .await?
        {
            AttemptSlot::Granted { attempts } => attempts,
            AttemptSlot::Exhausted => return Err(OtpError::AttemptsExceeded.into()),
            AttemptSlot::Gone => return Err(OtpError::NotFoundOrExpired.into()),
        };

        if !constant_time_eq(request.code.as_bytes(), record.code.as_bytes()) {
            let remaining_attempts = record.remaining_attempts(self.config.max_attempts);
            tracing::warn!(
                identifier = %masked,
                purpose = %key.purpose,
                attempts = record.attempts,
                remaining_attempts = remaining_attempts,
                event = "otp_verification_failed",
                "Invalid verification code"
            );
            return Err(OtpError::InvalidCode { remaining_attempts }.into());
        }

        if !self.repository.mark_used(&key, record.id).await? {
            // Another request consumed or superseded the record in between
            return Err(OtpError::NotFoundOrExpired.into());
        }

        tracing::info!(
            identifier = %masked,
            channel = %key.channel,
            purpose = %key.purpose,
            event = "otp_verified",
            "Verification code accepted"
        );

        Ok(VerifyOutcome {
            identifier: key.identifier,
            channel: key.channel,
            purpose: key.purpose,
        })
    }

    fn parse_identifier(&self, raw: &str, channel: Option<Channel>) -> Result<Identifier, OtpError> {
        Identifier::parse(raw, channel, &self.config.default_country_code)
    }

    async fn check_rate_limit(
        &self,
        limiter: &L,
        key: &str,
        masked: &str,
        action: &str,
    ) -> DomainResult<()> {
        let decision = limiter.consume(key).await?;
        if let RateLimitDecision::Limited { retry_after_ms } = decision {
            let retry_after_seconds = decision.retry_after_seconds().unwrap_or(1);
            tracing::warn!(
                identifier = %masked,
                action = action,
                retry_after_ms = retry_after_ms,
                event = "otp_rate_limited",
                "OTP request rate limit exceeded"
            );
            return Err(OtpError::RateLimited { retry_after_seconds }.into());
        }
        Ok(())
    }
}

/// A submitted code must be exactly six ASCII digits
fn validate_code(code: &str) -> Result<(), OtpError> {
    if code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(OtpError::validation("code", "must be exactly 6 digits"))
    }
}
