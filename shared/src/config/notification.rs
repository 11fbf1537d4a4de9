//! Notification delivery configuration (email and SMS providers)

use serde::{Deserialize, Serialize};

use super::env_or;

/// Email delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Write messages to the log (development)
    #[default]
    Log,
    /// SMTP relay with STARTTLS
    Smtp,
}

impl std::str::FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "mock" | "console" => Ok(EmailProvider::Log),
            "smtp" => Ok(EmailProvider::Smtp),
            _ => Err(format!("Invalid email provider: {}", s)),
        }
    }
}

/// SMS delivery provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Write messages to the log (development)
    #[default]
    Log,
    /// Twilio Messages API
    Twilio,
}

impl std::str::FromStr for SmsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" | "mock" | "console" => Ok(SmsProvider::Log),
            "twilio" => Ok(SmsProvider::Twilio),
            _ => Err(format!("Invalid SMS provider: {}", s)),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Mailbox used in the `From` header, e.g. `Roomly <no-reply@roomly.app>`
    pub from_address: String,
}

impl SmtpConfig {
    /// Load from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `EMAIL_FROM`.
    ///
    /// Returns `None` when the host or credentials are missing.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok()?;
        let username = std::env::var("SMTP_USERNAME").ok()?;
        let password = std::env::var("SMTP_PASSWORD").ok()?;

        Some(Self {
            host,
            port: env_or("SMTP_PORT", 587),
            username,
            password,
            from_address: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Roomly <no-reply@roomly.app>".to_string()),
        })
    }
}

/// Twilio Messages API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TwilioConfig {
    /// Twilio Account SID
    pub account_sid: String,
    /// Twilio Auth Token
    #[serde(skip_serializing)]
    pub auth_token: String,
    /// Sender number in E.164 format
    pub from_number: String,
    /// Maximum send attempts for retryable failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Timeout for API requests in seconds
    pub request_timeout_secs: u64,
    /// API root, overridable for tests
    pub api_base: String,
}

impl TwilioConfig {
    /// Load from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_FROM_NUMBER`.
    ///
    /// Returns `None` when any credential is missing.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").ok()?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").ok()?,
            from_number: std::env::var("TWILIO_FROM_NUMBER").ok()?,
            max_retries: env_or("TWILIO_MAX_RETRIES", 3),
            retry_delay_ms: env_or("TWILIO_RETRY_DELAY_MS", 500),
            request_timeout_secs: env_or("TWILIO_REQUEST_TIMEOUT_SECS", 10),
            api_base: std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
        })
    }
}

/// Which transports deliver codes, and their credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub email_provider: EmailProvider,
    #[serde(default)]
    pub sms_provider: SmsProvider,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub twilio: Option<TwilioConfig>,
    /// Display name used in message bodies
    #[serde(default = "default_brand")]
    pub brand: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            email_provider: EmailProvider::Log,
            sms_provider: SmsProvider::Log,
            smtp: None,
            twilio: None,
            brand: default_brand(),
        }
    }
}

impl NotificationConfig {
    /// Load from `EMAIL_PROVIDER`, `SMS_PROVIDER` and the provider-specific variables
    pub fn from_env() -> Self {
        Self {
            email_provider: env_or("EMAIL_PROVIDER", EmailProvider::Log),
            sms_provider: env_or("SMS_PROVIDER", SmsProvider::Log),
            smtp: SmtpConfig::from_env(),
            twilio: TwilioConfig::from_env(),
            brand: std::env::var("NOTIFICATION_BRAND").unwrap_or_else(|_| default_brand()),
        }
    }
}

fn default_brand() -> String {
    String::from("Roomly")
}
