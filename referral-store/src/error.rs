//! Store Error Types

use referral_core::ReferralError;
use thiserror::Error;

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure reaching the store
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected or failed the operation
    #[error("Database error: {0}")]
    Database(String),

    /// Row lookup by a key that must exist came back empty
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Row (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn unique_violation(constraint: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    /// True when the error is a unique-constraint rejection.
    ///
    /// The duplicate-referee gate treats this as the canonical signal,
    /// so it must survive any wrapping the backends do.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for ReferralError {
    fn from(err: StoreError) -> Self {
        ReferralError::Storage(err.to_string())
    }
}
