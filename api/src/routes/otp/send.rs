use actix_web::{web, HttpRequest, HttpResponse};
use roomly_core::{IssueRequest, NotificationSender, OtpRepository, RateLimiter};
use roomly_shared::SuccessResponse;
use validator::Validate;

use super::{client_address, AppState};
use crate::dto::otp::{validation_message, SendOtpRequest};
use crate::handlers::error::{handle_domain_error, validation_error};

/// Handler for POST /api/v1/auth/otp/send
///
/// # Request Body
///
/// ```json
/// { "identifier": "student@example.com", "purpose": "signup" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// { "success": true, "message": "Verification code sent to st***@example.com", "expiresIn": 300 }
/// ```
///
/// ## Errors
/// 400 `VALIDATION_ERROR`, 429 `RATE_LIMITED` with `Retry-After`,
/// 500 `DELIVERY_FAILURE` or `INTERNAL_ERROR`
pub async fn send_otp<R, L, N>(
    req: HttpRequest,
    state: web::Data<AppState<R, L, N>>,
    request: web::Json<SendOtpRequest>,
) -> HttpResponse
where
    R: OtpRepository + 'static,
    L: RateLimiter + 'static,
    N: NotificationSender + 'static,
{
    if let Err(errors) = request.validate() {
        let message = validation_message(&errors);
        tracing::debug!(reason = %message, "Rejected send request");
        return validation_error(message);
    }

    let request = request.into_inner();
    let issue = IssueRequest {
        identifier: request.identifier,
        channel: request.channel,
        purpose: request.purpose.unwrap_or_default(),
        client_address: client_address(&req),
    };

    match state.otp_manager.issue(issue).await {
        Ok(outcome) => HttpResponse::Ok().json(
            SuccessResponse::new(format!(
                "Verification code sent to {}",
                outcome.masked_identifier
            ))
            .with_expires_in(outcome.expires_in),
        ),
        Err(error) => handle_domain_error(&error),
    }
}
