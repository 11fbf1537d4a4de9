//! One-time passcode record issued to an email address or phone number.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of verification attempts allowed per code
pub const MAX_ATTEMPTS: u32 = 3;

/// Length of the numeric code
pub const CODE_LENGTH: usize = 6;

/// Default lifetime of a code (5 minutes)
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Delivery medium for a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    #[serde(alias = "sms")]
    Phone,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Phone => "phone",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Channel::Email),
            "phone" | "sms" => Ok(Channel::Phone),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// Business reason a code was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Signup,
    Login,
    #[serde(alias = "password-reset")]
    PasswordReset,
    #[default]
    Verification,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Signup => "signup",
            Purpose::Login => "login",
            Purpose::PasswordReset => "password_reset",
            Purpose::Verification => "verification",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "signup" => Ok(Purpose::Signup),
            "login" => Ok(Purpose::Login),
            "password_reset" | "password-reset" => Ok(Purpose::PasswordReset),
            "verification" => Ok(Purpose::Verification),
            other => Err(format!("unknown purpose: {}", other)),
        }
    }
}

/// The triple a record is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OtpKey {
    pub identifier: String,
    pub channel: Channel,
    pub purpose: Purpose,
}

impl OtpKey {
    pub fn new(identifier: impl Into<String>, channel: Channel, purpose: Purpose) -> Self {
        Self {
            identifier: identifier.into(),
            channel,
            purpose,
        }
    }
}

/// A single issued code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Normalized email address or `+<digits>` phone number
    pub identifier: String,

    pub channel: Channel,

    /// The 6-digit code
    pub code: String,

    pub purpose: Purpose,

    /// Verification comparisons made against this code
    pub attempts: u32,

    /// Whether the code was consumed or superseded
    pub is_used: bool,

    /// Per-key issuance counter, assigned by the store
    pub generation: u64,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Creates a record with a freshly generated code, valid for `ttl_seconds` from `now`
    pub fn issue(key: &OtpKey, ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self::with_code(key, generate_code(), ttl_seconds, now)
    }

    /// Creates a record around an existing code
    pub fn with_code(key: &OtpKey, code: String, ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: key.identifier.clone(),
            channel: key.channel,
            code,
            purpose: key.purpose,
            attempts: 0,
            is_used: false,
            generation: 0,
            expires_at: now + Duration::seconds(ttl_seconds),
            created_at: now,
        }
    }

    pub fn key(&self) -> OtpKey {
        OtpKey::new(self.identifier.clone(), self.channel, self.purpose)
    }

    /// A record is expired once `now` reaches `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unused and unexpired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired_at(now)
    }

    /// Attempts left under a budget of `max_attempts`
    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    /// Whole seconds left before expiry, zero once expired
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    pub fn mark_used(&mut self) {
        self.is_used = true;
    }
}

/// Generates a code uniformly over `100000..=999999` using the OS CSPRNG
pub fn generate_code() -> String {
    OsRng.gen_range(100_000u32..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key() -> OtpKey {
        OtpKey::new("student@example.com", Channel::Email, Purpose::Signup)
    }

    #[test]
    fn test_issue_starts_fresh() {
        let now = Utc::now();
        let record = OtpRecord::issue(&key(), DEFAULT_TTL_SECONDS, now);

        assert_eq!(record.code.len(), CODE_LENGTH);
        assert_eq!(record.attempts, 0);
        assert!(!record.is_used);
        assert_eq!(record.expires_at, now + Duration::seconds(300));
        assert!(record.is_active_at(now));
        assert_eq!(record.key(), key());
    }

    #[test]
    fn test_generate_code_range() {
        for _ in 0..500 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_codes_vary() {
        let codes: HashSet<String> = (0..100).map(|_| generate_code()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_expiry_is_absolute() {
        let now = Utc::now();
        let record = OtpRecord::issue(&key(), 60, now);

        assert!(!record.is_expired_at(now + Duration::seconds(59)));
        assert!(record.is_expired_at(now + Duration::seconds(60)));
        assert!(!record.is_active_at(now + Duration::seconds(61)));
        assert_eq!(record.seconds_until_expiry(now), 60);
        assert_eq!(record.seconds_until_expiry(now + Duration::seconds(90)), 0);
    }

    #[test]
    fn test_used_record_is_inactive() {
        let now = Utc::now();
        let mut record = OtpRecord::issue(&key(), DEFAULT_TTL_SECONDS, now);
        record.mark_used();
        assert!(!record.is_active_at(now));
    }

    #[test]
    fn test_remaining_attempts_saturates() {
        let mut record = OtpRecord::issue(&key(), DEFAULT_TTL_SECONDS, Utc::now());
        assert_eq!(record.remaining_attempts(MAX_ATTEMPTS), MAX_ATTEMPTS);
        record.attempts = 2;
        assert_eq!(record.remaining_attempts(MAX_ATTEMPTS), 1);
        assert_eq!(record.remaining_attempts(2), 0);
        record.attempts = 7;
        assert_eq!(record.remaining_attempts(MAX_ATTEMPTS), 0);
    }

    #[test]
    fn test_purpose_wire_format() {
        assert_eq!(
            serde_json::to_value(Purpose::PasswordReset).unwrap(),
            "password_reset"
        );
        let parsed: Purpose = serde_json::from_str("\"password-reset\"").unwrap();
        assert_eq!(parsed, Purpose::PasswordReset);
        assert_eq!(Purpose::default(), Purpose::Verification);
        assert_eq!("LOGIN".parse::<Purpose>().unwrap(), Purpose::Login);
        assert!("sell".parse::<Purpose>().is_err());
    }

    #[test]
    fn test_channel_wire_format() {
        assert_eq!(serde_json::to_value(Channel::Phone).unwrap(), "phone");
        assert_eq!("email".parse::<Channel>().unwrap(), Channel::Email);
        assert!("fax".parse::<Channel>().is_err());
    }
}
