//! Twilio SMS transport
//!
//! Posts to the Twilio Messages REST API with basic auth. Rate limiting (429)
//! and server errors (5xx) are retried with exponential backoff; other client
//! errors fail immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use roomly_shared::utils::mask_phone_number;
use roomly_shared::TwilioConfig;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::InfrastructureError;

use super::transport::SmsTransport;

/// Twilio's limit for a single message body
pub const MAX_MESSAGE_LENGTH: usize = 1600;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// SMS transport backed by Twilio
pub struct TwilioSmsTransport {
    http: Client,
    config: TwilioConfig,
}

impl TwilioSmsTransport {
    pub fn new(config: TwilioConfig) -> Result<Self, InfrastructureError> {
        if !config.from_number.starts_with('+') {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format (starting with '+')".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            from = %mask_phone_number(&config.from_number),
            "Twilio SMS transport initialized"
        );

        Ok(Self { http, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    async fn send_once(&self, to: &str, body: &str) -> Result<String, Attempt> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", to), ("From", self.config.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| {
                // Timeouts and connection failures are worth another try
                Attempt::Retry(InfrastructureError::Http(e))
            })?;

        let status = response.status();
        if status.is_success() {
            let message: MessageResponse = response
                .json()
                .await
                .map_err(|e| Attempt::Fatal(InfrastructureError::Http(e)))?;
            return Ok(message.sid);
        }

        let detail = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .map(|e| format!("{} ({})", e.message.unwrap_or_default(), e.code.unwrap_or(0)))
            .unwrap_or_default();
        let err = InfrastructureError::Delivery(format!("Twilio returned {}: {}", status, detail));

        if is_retryable_status(status) {
            Err(Attempt::Retry(err))
        } else {
            Err(Attempt::Fatal(err))
        }
    }
}

enum Attempt {
    Retry(InfrastructureError),
    Fatal(InfrastructureError),
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry number `attempt` (1-based), doubling each time and capped at 10s
pub(crate) fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::from_millis(base_ms.saturating_mul(factor).min(10_000))
}

#[async_trait]
impl SmsTransport for TwilioSmsTransport {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, InfrastructureError> {
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(InfrastructureError::Delivery(format!(
                "Message exceeds maximum length of {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "Sending SMS attempt {}/{} to {}",
                attempt,
                max_attempts,
                mask_phone_number(to)
            );

            match self.send_once(to, body).await {
                Ok(sid) => {
                    info!(to = %mask_phone_number(to), sid = %sid, "SMS sent successfully");
                    return Ok(sid);
                }
                Err(Attempt::Retry(e)) if attempt < max_attempts => {
                    let delay = backoff_delay(self.config.retry_delay_ms, attempt);
                    warn!(
                        "Twilio send failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(Attempt::Retry(e)) | Err(Attempt::Fatal(e)) => {
                    error!(
                        to = %mask_phone_number(to),
                        error = %e,
                        "Failed to send SMS after {} attempt(s)",
                        attempt
                    );
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "twilio"
    }
}
