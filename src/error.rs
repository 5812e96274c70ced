//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::provider::Provider;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or unknown bearer token
/// - **Authorization Errors**: Caller is authenticated but not an admin
/// - **Validation Errors**: Invalid request data (e.g. blank API key)
/// - **Quota Errors**: No credential left under its daily limit
/// - **Resource Errors**: Requested credential not found
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bearer token is missing or does not belong to any user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    /// Caller's user record does not carry the `admin` role.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Admin role required")]
    Forbidden,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("{0}")]
    Validation(String),

    /// Every active credential of the provider is at or over its daily limit,
    /// or the provider has no active credential at all.
    ///
    /// Returns HTTP 429 Too Many Requests.
    #[error("No active key found for {0}")]
    QuotaExhausted(Provider),

    /// The targeted credential does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Credential not found")]
    CredentialNotFound,
}

impl AppError {
    /// Stable machine-readable code used in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "internal_error",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation_error",
            AppError::QuotaExhausted(_) => "quota_exhausted",
            AppError::CredentialNotFound => "credential_not_found",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::QuotaExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::CredentialNotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database errors are logged and replaced by a generic message so that
/// connection strings and SQL never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error while handling request");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Validation("api_key is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::QuotaExhausted(Provider::Brevo).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::CredentialNotFound.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn quota_exhausted_names_the_provider() {
        let err = AppError::QuotaExhausted(Provider::Gemini);
        assert_eq!(err.to_string(), "No active key found for gemini");
        assert_eq!(err.code(), "quota_exhausted");
    }

    #[test]
    fn validation_message_is_surfaced_verbatim() {
        let err = AppError::Validation("api_key must not be empty".into());
        assert_eq!(err.to_string(), "api_key must not be empty");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
