//! Email address utilities

use once_cell::sync::Lazy;
use regex::Regex;

// Applied after lowercasing
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?)*\.[a-z]{2,}$")
        .expect("email pattern is valid")
});

/// Longest address accepted (RFC 5321 path limit)
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Trim and lowercase an address, returning `None` if it is not a plausible email
pub fn normalize_email(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    is_valid_email(&normalized).then_some(normalized)
}

/// Check an already-normalized address
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH
        && !email.contains("..")
        && EMAIL_REGEX.is_match(email)
}

/// Mask an address for logs: `jo***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}
