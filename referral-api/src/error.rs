//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use referral_core::ReferralError;
use referral_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Validation error
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Missing or unusable principal
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Referral engine error
    #[error("{0}")]
    Referral(#[from] ReferralError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Referral(err) => match err {
                ReferralError::InvalidCode { .. } => StatusCode::NOT_FOUND,
                ReferralError::SelfReferral => StatusCode::UNPROCESSABLE_ENTITY,
                ReferralError::AlreadyReferred { .. } => StatusCode::CONFLICT,
                ReferralError::PersistenceFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ReferralError::InvalidPercentage { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
            ApiError::Referral(err) => err.kind(),
            ApiError::Store(_) => "STORE_ERROR",
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        ApiError::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            reason: reason.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_errors_map_to_stable_codes() {
        let err = ApiError::Referral(ReferralError::AlreadyReferred {
            email: "b@example.com".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "ALREADY_REFERRED");

        let err = ApiError::Referral(ReferralError::SelfReferral);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::Referral(ReferralError::InvalidCode {
            code: "ZZZZ9999".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::Referral(ReferralError::PersistenceFailure { attempts: 3 });
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_error() {
        let err = ApiError::validation("missing session header");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_unauthorized_error() {
        let err = ApiError::unauthorized("no principal headers");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
    }
}
