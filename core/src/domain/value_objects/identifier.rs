//! Normalized email address or phone number an OTP is bound to.

use std::fmt;

use roomly_shared::utils::{mask_email, mask_phone_number, normalize_email, normalize_phone_number};

use crate::domain::entities::otp_record::Channel;
use crate::errors::OtpError;

/// A validated, normalized identifier together with its channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    value: String,
    channel: Channel,
}

impl Identifier {
    /// Parse raw user input.
    ///
    /// With no explicit channel, anything containing `@` is treated as an
    /// email address; everything else must parse as a phone number.
    /// `default_country_code` is prefixed to bare 10-digit national numbers.
    pub fn parse(
        raw: &str,
        channel: Option<Channel>,
        default_country_code: &str,
    ) -> Result<Self, OtpError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(OtpError::validation("identifier", "must not be empty"));
        }

        let channel = channel.unwrap_or(if trimmed.contains('@') {
            Channel::Email
        } else {
            Channel::Phone
        });

        let value = match channel {
            Channel::Email => normalize_email(trimmed)
                .ok_or_else(|| OtpError::validation("identifier", "invalid email address"))?,
            Channel::Phone => normalize_phone_number(trimmed, default_country_code)
                .ok_or_else(|| {
                    OtpError::validation("identifier", "must be an email address or phone number")
                })?,
        };

        Ok(Self { value, channel })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Rendering safe for logs and response messages
    pub fn masked(&self) -> String {
        match self.channel {
            Channel::Email => mask_email(&self.value),
            Channel::Phone => mask_phone_number(&self.value),
        }
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
