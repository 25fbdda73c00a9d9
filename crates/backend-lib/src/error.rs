// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::token::TokenError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate credential: {0}")]
    DuplicateCredential(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Token rejected: {0}")]
    Token(#[from] TokenError),

    #[error("Not authorized to modify this resource")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend store unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateCredential(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::MissingToken | AppError::Token(_) => {
                StatusCode::UNAUTHORIZED
            },
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConnectionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::DuplicateCredential(_) => "DUP_001",
            // All authentication failures share one code so a rejected token
            // looks identical to a rejected password from the outside.
            AppError::InvalidCredentials | AppError::MissingToken | AppError::Token(_) => {
                "AUTH_001"
            },
            AppError::Forbidden => "AUTHZ_001",
            AppError::NotFound(_) => "NF_001",
            AppError::ConnectionUnavailable(_) => "CONN_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateCredential(field) => {
                format!("An account with this {field} already exists")
            },
            AppError::InvalidCredentials | AppError::MissingToken | AppError::Token(_) => {
                "Authentication failed".to_string()
            },
            AppError::Forbidden => "Not authorized to modify this resource".to_string(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::ConnectionUnavailable(_) => {
                "Service temporarily unavailable".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Io(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("username too short".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateCredential("email".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Token(TokenError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("Item".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ConnectionUnavailable("dial timed out".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_failures_collapse_to_one_code() {
        // A malformed token, a bad signature, an expired token and a wrong
        // password must be indistinguishable from the response alone.
        let variants = [
            AppError::InvalidCredentials,
            AppError::MissingToken,
            AppError::Token(TokenError::Malformed),
            AppError::Token(TokenError::InvalidSignature),
            AppError::Token(TokenError::Expired),
        ];
        for err in variants {
            assert_eq!(err.error_code(), "AUTH_001");
            assert_eq!(err.sanitized_message(), "Authentication failed");
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_error_from_impls() {
        let io_err = IoError::new(ErrorKind::PermissionDenied, "Permission denied");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));

        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));

        let app_err: AppError = "Str error".into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_error_serialization() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
