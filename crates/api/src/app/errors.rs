use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use orgadmin_auth::{DenyReason, ResolveError, TokenError};
use orgadmin_core::DomainError;

/// Every failure a handler can return, mapped to a status and a stable code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthenticated(ResolveError),

    #[error(transparent)]
    Forbidden(DenyReason),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

impl From<ResolveError> for ApiError {
    fn from(value: ResolveError) -> Self {
        Self::Unauthenticated(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated(e) => json_error(StatusCode::UNAUTHORIZED, e.code(), e.to_string()),
            // Invariant guards are not a question of the caller's rights.
            ApiError::Forbidden(reason) if reason.is_invariant() => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, reason.code(), reason.to_string())
            }
            ApiError::Forbidden(reason) => json_error(StatusCode::FORBIDDEN, reason.code(), reason.to_string()),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::Token(e) => {
                tracing::error!(error = %e, "token issuance failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ERROR", "could not issue token")
            }
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "INVALID_ID", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "INVARIANT_VIOLATION", msg)
        }
        DomainError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found")),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "CONFLICT", msg),
        DomainError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "invalid email or password")
        }
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", "internal error")
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::Unauthenticated(ResolveError::NoToken), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden(DenyReason::CompanyMismatch), StatusCode::FORBIDDEN),
            (ApiError::Forbidden(DenyReason::SuperadminUndeletable), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::validation("x").into(), StatusCode::BAD_REQUEST),
            (DomainError::conflict("x").into(), StatusCode::CONFLICT),
            (DomainError::invariant("x").into(), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::not_found("user").into(), StatusCode::NOT_FOUND),
            (DomainError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (ApiError::bad_request("x"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
