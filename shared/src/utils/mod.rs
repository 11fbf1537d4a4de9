//! Common utility functions

pub mod email;
pub mod mask;
pub mod phone;

pub use email::{mask_email, normalize_email};
pub use mask::mask_identifier;
pub use phone::{mask_phone_number, normalize_phone_number};
