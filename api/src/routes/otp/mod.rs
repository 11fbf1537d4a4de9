//! One-time passcode route handlers
//!
//! - `POST /api/v1/auth/otp/send` issues a code and hands it to the provider
//! - `POST /api/v1/auth/otp/verify` checks a submitted code

pub mod send;
pub mod verify;

use std::sync::Arc;

use actix_web::HttpRequest;
use roomly_core::{NotificationSender, OtpManager, OtpRepository, RateLimiter};

pub use send::send_otp;
pub use verify::verify_otp;

/// Application state that holds shared services
pub struct AppState<R, L, N>
where
    R: OtpRepository,
    L: RateLimiter,
    N: NotificationSender,
{
    pub otp_manager: Arc<OtpManager<R, L, N>>,
}

impl<R, L, N> AppState<R, L, N>
where
    R: OtpRepository,
    L: RateLimiter,
    N: NotificationSender,
{
    pub fn new(otp_manager: Arc<OtpManager<R, L, N>>) -> Self {
        Self { otp_manager }
    }
}

/// Extract the client address used to key rate limits
///
/// First entry of `X-Forwarded-For`, then `X-Real-IP`, then the peer address.
pub fn client_address(req: &HttpRequest) -> String {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            if let Some(ip) = forwarded_str.split(',').next().map(str::trim) {
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            let ip = ip_str.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
