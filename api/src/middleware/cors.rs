//! CORS middleware configuration for cross-origin requests.
//!
//! The OTP endpoints are called from the Roomly web and mobile clients.
//! Development runs with `*` so any local origin works; other environments
//! list their origins in `CORS_ALLOWED_ORIGINS`.

use actix_cors::Cors;
use actix_web::http::{header, Method};
use roomly_shared::CorsConfig;

/// Creates a CORS middleware instance from configuration.
///
/// An empty origin list allows no cross-origin callers at all.
pub fn create_cors(config: &CorsConfig) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::USER_AGENT,
            header::HeaderName::from_static("x-requested-with"),
            header::HeaderName::from_static("x-app-version"),
            header::HeaderName::from_static("x-platform"),
        ])
        .expose_headers(vec![header::RETRY_AFTER])
        .max_age(config.max_age);

    if config.allows_any_origin() {
        tracing::info!("Configuring permissive CORS (any origin)");
        return cors.allow_any_origin();
    }

    config
        .allowed_origins
        .iter()
        .fold(cors, |cors, origin| {
            tracing::info!("Adding allowed origin: {}", origin);
            cors.allowed_origin(origin)
        })
}
