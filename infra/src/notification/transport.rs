//! Raw delivery traits implemented by each provider

use async_trait::async_trait;

use crate::InfrastructureError;

use super::templates::EmailMessage;

/// Delivers a rendered email
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send `message`, returning the provider message id
    async fn send_email(&self, message: &EmailMessage) -> Result<String, InfrastructureError>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}

/// Delivers an SMS body to an E.164 number
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send `body` to `to`, returning the provider message id
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, InfrastructureError>;

    fn name(&self) -> &'static str;
}
