//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// E.164: '+', a country code that does not start with 0, 8-15 digits in total
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{7,14}$").expect("E.164 pattern is valid")
});

/// Length of a national number that gets the default country code prefixed
pub const NATIONAL_NUMBER_LENGTH: usize = 10;

/// Characters tolerated as formatting inside a phone number
fn is_formatting(c: char) -> bool {
    matches!(c, ' ' | '-' | '(' | ')' | '.')
}

/// Normalize user input to an E.164-like `+<digits>` string.
///
/// - a leading `+` keeps the number as written;
/// - a bare 10-digit national number gets `default_country_code` prefixed;
/// - 11-15 bare digits are assumed to already carry a country code.
///
/// Returns `None` for anything else, including input containing letters.
pub fn normalize_phone_number(raw: &str, default_country_code: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (has_plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit() || is_formatting(c)) {
        return None;
    }

    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    let country_code = default_country_code.trim_start_matches('+');

    let candidate = if has_plus {
        format!("+{}", digits)
    } else if digits.len() == NATIONAL_NUMBER_LENGTH {
        format!("+{}{}", country_code, digits)
    } else if (NATIONAL_NUMBER_LENGTH + 1..=15).contains(&digits.len()) {
        format!("+{}", digits)
    } else {
        return None;
    };

    is_valid_e164(&candidate).then_some(candidate)
}

/// Check if a phone number is in E.164 format
pub fn is_valid_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logs, keeping the `+` and the last four digits
pub fn mask_phone_number(phone: &str) -> String {
    let visible = 4;
    let digits = phone.trim_start_matches('+');
    if digits.len() <= visible {
        return "*".repeat(phone.len());
    }

    let masked = "*".repeat(digits.len() - visible);
    let tail = &digits[digits.len() - visible..];
    if phone.starts_with('+') {
        format!("+{}{}", masked, tail)
    } else {
        format!("{}{}", masked, tail)
    }
}
