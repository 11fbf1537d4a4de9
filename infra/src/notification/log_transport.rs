//! Development transport that writes messages to the log
//!
//! Destinations are always masked. Message bodies, which contain the code,
//! are only logged when `reveal_codes` is set.

use async_trait::async_trait;
use roomly_shared::utils::{mask_email, mask_phone_number};
use uuid::Uuid;

use crate::InfrastructureError;

use super::templates::EmailMessage;
use super::transport::{EmailTransport, SmsTransport};

#[derive(Debug, Clone, Default)]
pub struct LogTransport {
    reveal_codes: bool,
}

impl LogTransport {
    pub fn new(reveal_codes: bool) -> Self {
        Self { reveal_codes }
    }

    pub fn reveals_codes(&self) -> bool {
        self.reveal_codes
    }

    fn message_id() -> String {
        format!("log-{}", Uuid::new_v4())
    }
}

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, InfrastructureError> {
        let message_id = Self::message_id();
        if self.reveal_codes {
            tracing::info!(
                to = %mask_email(&message.to),
                subject = %message.subject,
                body = %message.text_body,
                message_id = %message_id,
                "[log transport] email"
            );
        } else {
            tracing::info!(
                to = %mask_email(&message.to),
                subject = %message.subject,
                message_id = %message_id,
                "[log transport] email"
            );
        }
        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[async_trait]
impl SmsTransport for LogTransport {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, InfrastructureError> {
        let message_id = Self::message_id();
        if self.reveal_codes {
            tracing::info!(
                to = %mask_phone_number(to),
                body = %body,
                message_id = %message_id,
                "[log transport] sms"
            );
        } else {
            tracing::info!(
                to = %mask_phone_number(to),
                message_id = %message_id,
                "[log transport] sms"
            );
        }
        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
