//! Notification module for OTP delivery
//!
//! Codes are rendered into provider-neutral messages and handed to an
//! [`EmailTransport`] or [`SmsTransport`]. Supported transports:
//! - SMTP relay (lettre)
//! - Twilio Messages API (reqwest)
//! - Log transport for development
//!
//! [`create_notification_dispatcher`] picks transports from configuration and
//! falls back to the log transport when a provider cannot be initialized.

pub mod dispatcher;
pub mod email;
pub mod log_transport;
pub mod templates;
pub mod transport;
pub mod twilio;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use roomly_shared::{EmailProvider, NotificationConfig, OtpConfig, SmsProvider};
use tracing::{info, warn};

pub use dispatcher::NotificationDispatcher;
pub use email::SmtpEmailTransport;
pub use log_transport::LogTransport;
pub use templates::EmailMessage;
pub use transport::{EmailTransport, SmsTransport};
pub use twilio::TwilioSmsTransport;

/// Build the dispatcher described by `config`
///
/// A provider that is selected but missing credentials, or that fails to
/// initialize, is replaced by [`LogTransport`] with a warning.
pub fn create_notification_dispatcher(
    config: &NotificationConfig,
    otp: &OtpConfig,
) -> NotificationDispatcher {
    let fallback = LogTransport::new(otp.reveal_codes);

    let email: Arc<dyn EmailTransport> = match (config.email_provider, config.smtp.as_ref()) {
        (EmailProvider::Smtp, Some(smtp)) => match SmtpEmailTransport::new(smtp) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                warn!(error = %e, "SMTP transport unavailable, falling back to log transport");
                Arc::new(fallback.clone())
            }
        },
        (EmailProvider::Smtp, None) => {
            warn!("EMAIL_PROVIDER=smtp but SMTP settings are incomplete, using log transport");
            Arc::new(fallback.clone())
        }
        (EmailProvider::Log, _) => Arc::new(fallback.clone()),
    };

    let sms: Arc<dyn SmsTransport> = match (config.sms_provider, config.twilio.as_ref()) {
        (SmsProvider::Twilio, Some(twilio)) => match TwilioSmsTransport::new(twilio.clone()) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                warn!(error = %e, "Twilio transport unavailable, falling back to log transport");
                Arc::new(fallback.clone())
            }
        },
        (SmsProvider::Twilio, None) => {
            warn!("SMS_PROVIDER=twilio but Twilio credentials are incomplete, using log transport");
            Arc::new(fallback.clone())
        }
        (SmsProvider::Log, _) => Arc::new(fallback),
    };

    info!(
        email = email.name(),
        sms = sms.name(),
        "Notification dispatcher configured"
    );

    NotificationDispatcher::new(email, sms, config.brand.clone(), otp.ttl_seconds)
}
