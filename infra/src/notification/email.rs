//! SMTP email transport
//!
//! Sends plain-text messages through a STARTTLS relay using lettre.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use roomly_shared::utils::mask_email;
use roomly_shared::SmtpConfig;
use tracing::{error, info};

use crate::InfrastructureError;

use super::templates::EmailMessage;
use super::transport::EmailTransport;

/// Email transport backed by an SMTP relay
#[derive(Clone)]
pub struct SmtpEmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailTransport {
    /// Build the relay client. No connection is made until the first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, InfrastructureError> {
        let from: Mailbox = config.from_address.parse().map_err(|_| {
            InfrastructureError::Config(format!("Invalid EMAIL_FROM: {}", config.from_address))
        })?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        info!(host = %config.host, port = config.port, "SMTP email transport initialized");

        Ok(Self { mailer, from })
    }

    fn build_message(&self, message: &EmailMessage) -> Result<Message, InfrastructureError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| InfrastructureError::Delivery("invalid recipient address".to_string()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body.clone())
            .map_err(|e| InfrastructureError::Delivery(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, InfrastructureError> {
        let email = self.build_message(message)?;

        let response = self.mailer.send(email).await.map_err(|e| {
            error!(to = %mask_email(&message.to), error = %e, "SMTP delivery failed");
            InfrastructureError::Smtp(e)
        })?;

        let message_id = response
            .message()
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| response.code().to_string());

        info!(to = %mask_email(&message.to), "Email sent successfully");
        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
