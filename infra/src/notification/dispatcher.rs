//! Routes rendered codes to the configured email and SMS transports

use std::sync::Arc;

use async_trait::async_trait;
use roomly_core::domain::entities::otp_record::Purpose;
use roomly_core::services::notification::NotificationSender;
use tracing::debug;

use super::templates::{render_email, sms_body};
use super::transport::{EmailTransport, SmsTransport};

/// [`NotificationSender`] that renders templates and hands them to a transport
#[derive(Clone)]
pub struct NotificationDispatcher {
    email: Arc<dyn EmailTransport>,
    sms: Arc<dyn SmsTransport>,
    brand: String,
    ttl_seconds: i64,
}

impl NotificationDispatcher {
    pub fn new(
        email: Arc<dyn EmailTransport>,
        sms: Arc<dyn SmsTransport>,
        brand: impl Into<String>,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            email,
            sms,
            brand: brand.into(),
            ttl_seconds,
        }
    }

    pub fn email_transport_name(&self) -> &'static str {
        self.email.name()
    }

    pub fn sms_transport_name(&self) -> &'static str {
        self.sms.name()
    }
}

#[async_trait]
impl NotificationSender for NotificationDispatcher {
    async fn send_email(&self, address: &str, code: &str, purpose: Purpose) -> Result<String, String> {
        let message = render_email(&self.brand, address, purpose, code, self.ttl_seconds);
        debug!(transport = self.email.name(), purpose = %purpose, "Dispatching email code");

        self.email
            .send_email(&message)
            .await
            .map_err(|e| format!("{} transport: {}", self.email.name(), e))
    }

    async fn send_sms(&self, number: &str, code: &str, purpose: Purpose) -> Result<String, String> {
        let body = sms_body(&self.brand, purpose, code, self.ttl_seconds);
        debug!(transport = self.sms.name(), purpose = %purpose, "Dispatching SMS code");

        self.sms
            .send_sms(number, &body)
            .await
            .map_err(|e| format!("{} transport: {}", self.sms.name(), e))
    }
}
