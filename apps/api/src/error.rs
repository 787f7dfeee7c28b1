//! Error types for the HTTP API.
//!
//! Every handler returns [`ApiResult`]. The error becomes a status code plus
//! a JSON body the web client can branch on:
//!
//! ```text
//! { "code": "NOT_FOUND", "message": "Product not found: PRD00009" }
//! ```
//!
//! Internal failures are logged server-side and answered with a generic
//! message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopfront_core::{CoreError, ValidationError};
use shopfront_db::DbError;
use tracing::error;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { .. } => ApiError::NotFound(error.to_string()),
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::InsufficientStock { .. }
            | DbError::InvalidState { .. } => ApiError::Conflict(error.to_string()),
            DbError::Validation(_) | DbError::ConstraintViolation(_) => {
                ApiError::Validation(error.to_string())
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error.to_string())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let cases = [
            (DbError::not_found("Product", "PRD00009"), StatusCode::NOT_FOUND),
            (DbError::duplicate("username", "alice"), StatusCode::CONFLICT),
            (
                DbError::InsufficientStock {
                    sku: "PRD00001".to_string(),
                    requested: 4,
                },
                StatusCode::CONFLICT,
            ),
            (
                DbError::invalid_state("Purchase order", "PO000001", "already received"),
                StatusCode::CONFLICT,
            ),
            (
                DbError::Validation(CoreError::EmptyDocument {
                    document: "Invoice".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (DbError::PoolExhausted, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (db_error, status) in cases {
            assert_eq!(ApiError::from(db_error).status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_returned() {
        let response =
            ApiError::Internal("disk I/O error at /var/lib/shop.db".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INTERNAL");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = ApiError::from(DbError::not_found("Product", "PRD00009")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Product not found: PRD00009");
    }
}
