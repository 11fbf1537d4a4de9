use roomly_core::{Channel, Purpose};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Email address or phone number, e.g. "student@example.com", "+14155552671", "4155552671"
    #[validate(length(min = 3, max = 254, message = "must be between 3 and 254 characters"))]
    pub identifier: String,

    /// Defaults to `verification`
    #[serde(default)]
    pub purpose: Option<Purpose>,

    /// Inferred from the identifier when omitted
    #[serde(default)]
    pub channel: Option<Channel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 3, max = 254, message = "must be between 3 and 254 characters"))]
    pub identifier: String,

    /// 6-digit verification code
    #[validate(length(equal = 6, message = "must be exactly 6 digits"))]
    pub code: String,

    #[serde(default)]
    pub purpose: Option<Purpose>,

    #[serde(default)]
    pub channel: Option<Channel>,
}

/// Flatten validator output into one message, fields in name order
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let reason = errs
                .iter()
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{} {}", field, reason)
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
