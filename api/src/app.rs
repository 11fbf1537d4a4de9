//! Application routes and factory
//!
//! Handlers are generic over the store, limiter and sender so the binary and
//! the tests register the same routes with different backends.

use actix_web::{web, HttpResponse};
use roomly_core::{NotificationSender, OtpRepository, RateLimiter};
use roomly_shared::HealthResponse;

use crate::handlers::error::{json_error_handler, not_found};
use crate::routes::otp::{send_otp, verify_otp};

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "roomly-otp";

/// Register routes, the JSON extractor config and the 404 fallback
///
/// Application state (`web::Data<AppState<R, L, N>>`) must be added by the caller.
pub fn configure_app<R, L, N>(cfg: &mut web::ServiceConfig, max_payload_size: usize)
where
    R: OtpRepository + 'static,
    L: RateLimiter + 'static,
    N: NotificationSender + 'static,
{
    cfg.app_data(
        web::JsonConfig::default()
            .limit(max_payload_size)
            .error_handler(json_error_handler),
    )
    // Health check endpoint
    .route("/health", web::get().to(health_check))
    // API v1 routes
    .service(
        web::scope("/api/v1/auth/otp")
            .route("/send", web::post().to(send_otp::<R, L, N>))
            .route("/verify", web::post().to(verify_otp::<R, L, N>)),
    )
    // Default 404 handler
    .default_service(web::route().to(not_found));
}

/// Health check endpoint handler
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::healthy(
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
    ))
}
