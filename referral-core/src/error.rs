//! Referral Error Registry
//!
//! Error code format: REF-{module}-{sequence}
//! - REF-CODE: referral code resolution and allocation
//! - REF-ACT: activity creation (duplicate / self-referral gates)
//! - REF-STAT: referrer stat persistence
//! - REF-DISC: discount validation
//!
//! Every variant is recoverable: none is fatal to the surrounding
//! application, and callers branch on the variant rather than parsing
//! the display string.

use thiserror::Error;

/// Referral result type
pub type ReferralResult<T> = Result<T, ReferralError>;

/// Referral error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferralError {
    /// [REF-CODE-001] Code does not resolve to any user
    #[error("[REF-CODE-001] Referral code {code} does not match any user")]
    InvalidCode { code: String },

    /// [REF-CODE-002] Unique code allocation exhausted its retries
    #[error("[REF-CODE-002] Could not allocate a unique referral code after {attempts} attempts")]
    CodeCollision { attempts: u32 },

    /// [REF-ACT-001] Referrer and referee are the same user
    #[error("[REF-ACT-001] Users cannot refer themselves")]
    SelfReferral,

    /// [REF-ACT-002] The referee email already has an activity
    #[error("[REF-ACT-002] {email} has already been referred")]
    AlreadyReferred { email: String },

    /// [REF-STAT-001] Referrer stats not persisted after retry exhaustion
    #[error("[REF-STAT-001] Referrer stats not persisted after {attempts} attempts")]
    PersistenceFailure { attempts: u32 },

    /// [REF-DISC-001] Percentage outside the 0-100 range
    #[error("[REF-DISC-001] Discount percentage {value} outside 0-100")]
    InvalidPercentage { value: u8 },

    /// User row expected but absent
    #[error("User {uid} not found")]
    UserNotFound { uid: String },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ReferralError {
    /// Stable machine-readable kind, for API bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ReferralError::InvalidCode { .. } => "INVALID_CODE",
            ReferralError::CodeCollision { .. } => "CODE_COLLISION",
            ReferralError::SelfReferral => "SELF_REFERRAL",
            ReferralError::AlreadyReferred { .. } => "ALREADY_REFERRED",
            ReferralError::PersistenceFailure { .. } => "PERSISTENCE_FAILURE",
            ReferralError::InvalidPercentage { .. } => "INVALID_PERCENTAGE",
            ReferralError::UserNotFound { .. } => "USER_NOT_FOUND",
            ReferralError::Storage(_) => "STORAGE_ERROR",
            ReferralError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for ReferralError {
    fn from(err: serde_json::Error) -> Self {
        ReferralError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_display() {
        let err = ReferralError::AlreadyReferred {
            email: "referee@example.com".to_string(),
        };
        assert!(err.to_string().contains("[REF-ACT-002]"));
        assert_eq!(err.kind(), "ALREADY_REFERRED");
    }

    #[test]
    fn test_kind_is_stable_per_variant() {
        assert_eq!(ReferralError::SelfReferral.kind(), "SELF_REFERRAL");
        assert_eq!(
            ReferralError::PersistenceFailure { attempts: 3 }.kind(),
            "PERSISTENCE_FAILURE"
        );
    }
}
