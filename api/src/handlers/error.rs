//! Mapping from domain errors to HTTP responses
//!
//! Every failure leaves the API as the shared [`ErrorResponse`] envelope.
//! Store, provider and internal failures are reduced to a generic message;
//! their detail is logged here and never returned.

use actix_web::{
    error::{InternalError, JsonPayloadError},
    http::{header, StatusCode},
    HttpRequest, HttpResponse,
};
use roomly_core::{DomainError, OtpError};
use roomly_shared::error_codes;

use crate::dto::{ErrorResponse, ErrorResponseExt};

const INTERNAL_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Status code and envelope for a domain error
pub fn error_body(error: &DomainError) -> (StatusCode, ErrorResponse) {
    match error {
        DomainError::Otp(otp) => match otp {
            OtpError::Validation { .. } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::VALIDATION_ERROR, otp.to_string()),
            ),
            OtpError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new(error_codes::RATE_LIMITED, otp.to_string())
                    .with_retry_after(*retry_after_seconds),
            ),
            OtpError::NotFoundOrExpired => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::OTP_NOT_FOUND_OR_EXPIRED, otp.to_string()),
            ),
            OtpError::AttemptsExceeded => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::OTP_ATTEMPTS_EXCEEDED, otp.to_string()),
            ),
            OtpError::InvalidCode { remaining_attempts } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(error_codes::OTP_INVALID, otp.to_string())
                    .with_remaining_attempts(*remaining_attempts),
            ),
            OtpError::DeliveryFailure => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(error_codes::DELIVERY_FAILURE, otp.to_string()),
            ),
        },
        DomainError::Storage { .. } | DomainError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(error_codes::INTERNAL_ERROR, INTERNAL_MESSAGE),
        ),
    }
}

/// Convert a domain error into the HTTP response sent to the client
pub fn handle_domain_error(error: &DomainError) -> HttpResponse {
    let (status, body) = error_body(error);

    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    }

    match body.retry_after {
        Some(seconds) => HttpResponse::build(status)
            .insert_header((header::RETRY_AFTER, seconds.to_string()))
            .json(body),
        None => body.to_response(status),
    }
}

/// 400 envelope for a request rejected before reaching the manager
pub fn validation_error(message: impl Into<String>) -> HttpResponse {
    ErrorResponse::new(error_codes::VALIDATION_ERROR, message).to_response(StatusCode::BAD_REQUEST)
}

/// `JsonConfig` error handler: malformed bodies get the same 400 envelope
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Content-Type must be application/json".to_string(),
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "Request body is too large".to_string()
        }
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        _ => "Invalid request body".to_string(),
    };

    tracing::debug!(error = %err, "Rejected request body");
    InternalError::from_response(err, validation_error(message)).into()
}

/// Default service: JSON 404
pub async fn not_found() -> HttpResponse {
    ErrorResponse::new(error_codes::NOT_FOUND, "The requested resource was not found")
        .to_response(StatusCode::NOT_FOUND)
}
