use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use sea_orm::TransactionError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Unprocessable Entity")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional detail (e.g., the list of parts short on stock)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input shape or range. Reported to the caller, nothing mutated.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Operation not valid for the entity's current status. Nothing mutated.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership mismatch. Nothing mutated.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Insufficient or unavailable inventory, with the shortfall detail.
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A post-condition was violated after partial success. This is a bug,
    /// never an expected outcome; it aborts and rolls back the operation.
    #[error("Consistency error: {0}")]
    ConsistencyError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<TransactionError<ServiceError>> for ServiceError {
    fn from(err: TransactionError<ServiceError>) -> Self {
        match err {
            TransactionError::Connection(e) => ServiceError::DatabaseError(e),
            TransactionError::Transaction(e) => e,
        }
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::ConsistencyError(_)
            | Self::EventError(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message suitable for HTTP responses. Internal errors get
    /// generic bodies so implementation details do not leak; consistency
    /// errors keep their detail because operators must see them.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_taxonomy() {
        assert_eq!(
            ServiceError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidOperation("state".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Forbidden("role".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::InsufficientStock("short".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::ConsistencyError("broken".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn consistency_errors_keep_their_detail() {
        let err = ServiceError::ConsistencyError("part vanished mid-flight".into());
        assert!(err.response_message().contains("part vanished"));
        // database detail must never leak
        let db = ServiceError::db_error("connection reset");
        assert_eq!(db.response_message(), "Database error");
    }
}
