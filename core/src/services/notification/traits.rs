//! Trait for notification delivery integration

use async_trait::async_trait;

use crate::domain::entities::otp_record::Purpose;

/// Hands a code to the email or SMS provider
///
/// Errors are plain strings for logging only; they never reach a client.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send a code by email, returning the provider message id
    async fn send_email(&self, address: &str, code: &str, purpose: Purpose) -> Result<String, String>;

    /// Send a code by SMS, returning the provider message id
    async fn send_sms(&self, number: &str, code: &str, purpose: Purpose) -> Result<String, String>;
}
