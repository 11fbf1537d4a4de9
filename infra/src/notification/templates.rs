//! Message text for each purpose

use roomly_core::domain::entities::otp_record::Purpose;

/// Rendered email ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

fn action(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Signup => "sign-up",
        Purpose::Login => "login",
        Purpose::PasswordReset => "password reset",
        Purpose::Verification => "verification",
    }
}

fn lifetime(ttl_seconds: i64) -> String {
    let minutes = ((ttl_seconds + 59) / 60).max(1);
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", minutes)
    }
}

pub fn email_subject(brand: &str, purpose: Purpose) -> String {
    match purpose {
        Purpose::PasswordReset => format!("Reset your {} password", brand),
        other => format!("Your {} {} code", brand, action(other)),
    }
}

pub fn email_body(brand: &str, purpose: Purpose, code: &str, ttl_seconds: i64) -> String {
    format!(
        "Your {brand} {action} code is {code}.\n\n\
         It expires in {lifetime}. If you did not request it, you can ignore this email.\n",
        brand = brand,
        action = action(purpose),
        code = code,
        lifetime = lifetime(ttl_seconds),
    )
}

pub fn sms_body(brand: &str, purpose: Purpose, code: &str, ttl_seconds: i64) -> String {
    format!(
        "{}: {} is your {} code. It expires in {}.",
        brand,
        code,
        action(purpose),
        lifetime(ttl_seconds)
    )
}

pub fn render_email(
    brand: &str,
    to: &str,
    purpose: Purpose,
    code: &str,
    ttl_seconds: i64,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: email_subject(brand, purpose),
        text_body: email_body(brand, purpose, code, ttl_seconds),
    }
}
