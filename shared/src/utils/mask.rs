//! Identifier masking for log output

use super::{email::mask_email, phone::mask_phone_number};

/// Mask an email address or phone number, whichever it looks like
pub fn mask_identifier(identifier: &str) -> String {
    if identifier.contains('@') {
        mask_email(identifier)
    } else {
        mask_phone_number(identifier)
    }
}
