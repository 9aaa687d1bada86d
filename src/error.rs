// Error handling for the resource handlers
// Provides the shared JSON error body and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::uploads::UploadError;

/// Main error type for the user and post handlers
///
/// Auth failures raised inside a resource handler are wrapped so that a single
/// handler signature covers both.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input. Maps to HTTP 400
    #[error("validation failed: {0}")]
    ValidationError(String),

    /// Resource not found by ID. Maps to HTTP 404
    #[error("{resource} with id {id} not found")]
    NotFound { resource: String, id: String },

    /// Write collides with an existing record. Maps to HTTP 409
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller is authenticated but acting on someone else's behalf. Maps to HTTP 403
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Database could not be reached. Maps to HTTP 503
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Any other failure. Maps to HTTP 500, details are only logged
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Consistent error response structure
///
/// Carries a machine-readable `error_code` and a human-readable `message`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// e.g. "VALIDATION_ERROR", "NOT_FOUND"
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: &str, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message: message.into(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(err) => err.status_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Auth(err) => return err.into_response(),
            ApiError::ValidationError(msg) => {
                debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorResponse::new("VALIDATION_ERROR", msg))
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", format!("{} with id {} not found", resource, id)),
                )
            }
            ApiError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, ErrorResponse::new("CONFLICT", msg))
            }
            ApiError::Forbidden(msg) => {
                warn!("Forbidden access attempt: {}", msg);
                (StatusCode::FORBIDDEN, ErrorResponse::new("FORBIDDEN", msg))
            }
            ApiError::StoreUnavailable(msg) => {
                error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("STORE_UNAVAILABLE", "Service temporarily unavailable"),
                )
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An internal server error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
            StoreError::DuplicateEmail => ApiError::Conflict("email already exists".to_string()),
            StoreError::Conflict(constraint) => {
                ApiError::Conflict(format!("record violates {}", constraint))
            }
            StoreError::Database(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => ApiError::InternalError(format!("upload write failed: {}", e)),
            other => ApiError::ValidationError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}
