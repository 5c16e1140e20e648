//! Error handling for the delivery tracker
//!
//! Provides consistent error responses in English and Ukrainian

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{DraftFull, FieldError};
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business rule errors
    #[error("Draft '{key}' already holds {max} items")]
    DraftFull { key: String, max: usize },

    #[error("Draft '{0}' has no items")]
    EmptyDraft(String),

    #[error("Insufficient stock of {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: Decimal,
        requested: Decimal,
    },

    // Storage errors
    #[error("Storage unavailable")]
    StoreUnavailable,

    #[error("Storage error: {0}")]
    Storage(StoreError),

    // External service errors
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Receipt recognition error: {0}")]
    ReceiptRecognition(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => AppError::StoreUnavailable,
            other => AppError::Storage(other),
        }
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Validation {
            field: err.field.to_string(),
            message: err.message.to_string(),
        }
    }
}

impl From<DraftFull> for AppError {
    fn from(err: DraftFull) -> Self {
        AppError::DraftFull {
            key: err.key,
            max: err.max,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_uk: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// HTTP status and localized body for this error
    pub fn detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_uk: format!("Некоректне значення поля {}", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_uk: format!("Не знайдено: {}", resource),
                    field: None,
                },
            ),
            AppError::DraftFull { key, max } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DRAFT_FULL".to_string(),
                    message_en: format!("Draft '{}' already holds the maximum of {} items", key, max),
                    message_uk: format!("Максимум {} товарів у чернетці", max),
                    field: None,
                },
            ),
            AppError::EmptyDraft(key) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "EMPTY_DRAFT".to_string(),
                    message_en: format!("Draft '{}' has no items", key),
                    message_uk: "Немає товарів для відправки".to_string(),
                    field: None,
                },
            ),
            AppError::InsufficientStock {
                product,
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message_en: format!(
                        "Not enough {}: available {}, requested {}",
                        product, available, requested
                    ),
                    message_uk: format!(
                        "Недостатньо товару \"{}\". Доступно: {}, запитано: {}",
                        product, available, requested
                    ),
                    field: Some("quantity".to_string()),
                },
            ),
            AppError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message_en: "Local storage is unavailable".to_string(),
                    message_uk: "Сховище даних недоступне".to_string(),
                    field: None,
                },
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message_en: "A storage error occurred".to_string(),
                    message_uk: "Помилка збереження даних".to_string(),
                    field: None,
                },
            ),
            AppError::SubmissionFailed(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "SUBMISSION_FAILED".to_string(),
                    message_en: format!("Submission failed: {}", msg),
                    message_uk: "Помилка відправки даних".to_string(),
                    field: None,
                },
            ),
            AppError::ReceiptRecognition(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "RECEIPT_RECOGNITION_ERROR".to_string(),
                    message_en: format!("Receipt recognition failed: {}", msg),
                    message_uk: "Не вдалося розпізнати чек".to_string(),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_uk: "Помилка налаштувань".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: msg.clone(),
                    message_uk: "Внутрішня помилка сервера".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
