//! Domain entities representing core business objects.

pub mod otp_record;

pub use otp_record::{
    generate_code, Channel, OtpKey, OtpRecord, Purpose,
    CODE_LENGTH, DEFAULT_TTL_SECONDS, MAX_ATTEMPTS,
};
