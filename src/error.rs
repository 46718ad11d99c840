//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::CardError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    // Domain errors
    #[error(transparent)]
    Card(#[from] CardError),

    // Server errors (5xx)
    #[error("Crypto error: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            // 401 Unauthorized: the required headers carry the caller's
            // identity, so a missing one means an unidentified caller
            AppError::MissingHeader(header) => {
                (StatusCode::UNAUTHORIZED, "missing_header", Some(header.clone()))
            }

            // 403 Forbidden
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),

            // Domain errors - map to appropriate HTTP status
            AppError::Card(ref card_err) => {
                if card_err.is_client_error() {
                    tracing::debug!("Business rule rejection: {}", card_err);
                }
                match card_err {
                    CardError::InvalidAmount(msg) => {
                        (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                    }
                    CardError::SameCardTransfer => {
                        (StatusCode::BAD_REQUEST, "same_card_transfer", None)
                    }
                    CardError::CardNotFound => (StatusCode::NOT_FOUND, "card_not_found", None),
                    CardError::CardNotActive { .. } => (
                        StatusCode::CONFLICT,
                        "card_not_active",
                        Some(card_err.to_string()),
                    ),
                    CardError::InsufficientFunds { .. } => (
                        StatusCode::CONFLICT,
                        "insufficient_funds",
                        Some(card_err.to_string()),
                    ),
                    CardError::CardAlreadyExists => {
                        (StatusCode::CONFLICT, "card_already_exists", None)
                    }
                    CardError::TransferConflict => {
                        (StatusCode::CONFLICT, "transfer_conflict", None)
                    }
                }
            }

            // 500 Internal Server Error
            AppError::Crypto(e) => {
                tracing::error!("Crypto error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "crypto_error", None)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
