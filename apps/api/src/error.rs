use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use claimlens_core::AppError;
use serde::Serialize;
use tracing::warn;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
///
/// Rejections issued before a query is dispatched are sanitized to a generic
/// "not authorized" message; the audit trail and server logs retain the full
/// detail for operators.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            AppError::UnknownTenant(_)
            | AppError::NoCredentialConfigured(_)
            | AppError::FilterValidationFailed(_) => {
                warn!(detail = %self.0, "mediation rejected before dispatch");
                (
                    StatusCode::FORBIDDEN,
                    "not authorized for this request".to_owned(),
                )
            }
            AppError::Backend(_) => {
                warn!(detail = %self.0, "query engine failure surfaced to caller");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream query engine error".to_owned(),
                )
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            AppError::AuditWriteFailed(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
            }
        };

        let payload = Json(ErrorResponse { message });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
