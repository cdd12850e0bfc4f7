//! Error types for Korpus services
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message shown to users whose query could not be parsed
pub const INVALID_QUERY_MESSAGE: &str = "Error, try again.";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    ValidationError,
    InvalidQuery,
    PayloadTooLarge,

    // Store errors
    DatabaseError,
    ConnectionError,
    LookupError,
    WriteError,
    IntegrityError,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Query could not be parsed; the user should rephrase it
    #[error("Invalid query `{query}`: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Payload too large: {size} items exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    // Store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidQuery { .. } => ErrorCode::InvalidQuery,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::Store(StoreError::Unavailable { .. }) => ErrorCode::ConnectionError,
            AppError::Store(StoreError::Lookup { .. }) => ErrorCode::LookupError,
            AppError::Store(StoreError::Write { .. }) => ErrorCode::WriteError,
            AppError::Store(StoreError::Integrity { .. }) => ErrorCode::IntegrityError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } | AppError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,

            // 413 Payload Too Large
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 503 Service Unavailable
            AppError::Store(StoreError::Unavailable { .. }) | AppError::DatabaseConnection { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            AppError::Store(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidQuery { .. } => INVALID_QUERY_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let details = match &self {
            AppError::InvalidQuery { query, reason } => Some(serde_json::json!({
                "query": query,
                "reason": reason,
            })),
            AppError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message: self.public_message(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_is_client_error() {
        let err = AppError::InvalidQuery {
            query: "xyz123!".into(),
            reason: "unrecognized term".into(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidQuery);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.is_client_error());
        assert_eq!(err.public_message(), INVALID_QUERY_MESSAGE);
    }

    #[test]
    fn test_store_error_mapping() {
        let fatal = AppError::from(StoreError::Unavailable {
            message: "pool closed".into(),
        });
        assert_eq!(fatal.code(), ErrorCode::ConnectionError);
        assert_eq!(fatal.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let lookup = AppError::from(StoreError::Lookup {
            message: "bad row".into(),
        });
        assert_eq!(lookup.code(), ErrorCode::LookupError);
        assert_eq!(lookup.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(lookup.is_server_error());
    }

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorCode::InvalidQuery).unwrap(),
            serde_json::json!("INVALID_QUERY")
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::PayloadTooLarge).unwrap(),
            serde_json::json!("PAYLOAD_TOO_LARGE")
        );
    }
}
