use actix_web::{web, HttpRequest, HttpResponse};
use roomly_core::{NotificationSender, OtpRepository, RateLimiter, VerifyRequest};
use roomly_shared::SuccessResponse;
use validator::Validate;

use super::{client_address, AppState};
use crate::dto::otp::{validation_message, VerifyOtpRequest};
use crate::handlers::error::{handle_domain_error, validation_error};

/// Handler for POST /api/v1/auth/otp/verify
///
/// # Request Body
///
/// ```json
/// { "identifier": "student@example.com", "code": "482913", "purpose": "signup" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "success": true, "message": "Verification successful" }
/// ```
///
/// ## Errors
/// 400 `VALIDATION_ERROR`, `OTP_NOT_FOUND_OR_EXPIRED`, `OTP_ATTEMPTS_EXCEEDED`
/// or `OTP_INVALID` (with `remainingAttempts`), 429 `RATE_LIMITED`, 500
pub async fn verify_otp<R, L, N>(
    req: HttpRequest,
    state: web::Data<AppState<R, L, N>>,
    request: web::Json<VerifyOtpRequest>,
) -> HttpResponse
where
    R: OtpRepository + 'static,
    L: RateLimiter + 'static,
    N: NotificationSender + 'static,
{
    if let Err(errors) = request.validate() {
        let message = validation_message(&errors);
        tracing::debug!(reason = %message, "Rejected verify request");
        return validation_error(message);
    }

    let request = request.into_inner();
    let verify = VerifyRequest {
        identifier: request.identifier,
        channel: request.channel,
        purpose: request.purpose.unwrap_or_default(),
        code: request.code,
        client_address: client_address(&req),
    };

    match state.otp_manager.verify(verify).await {
        Ok(_) => HttpResponse::Ok().json(SuccessResponse::new("Verification successful")),
        Err(error) => handle_domain_error(&error),
    }
}
