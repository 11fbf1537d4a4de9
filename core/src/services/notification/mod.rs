//! Outbound code delivery

mod traits;

pub use traits::NotificationSender;
