pub mod otp;

pub use otp::{AttemptSlot, InMemoryOtpRepository, OtpRepository};
