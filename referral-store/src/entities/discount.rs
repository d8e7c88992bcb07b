//! Referral Discount Entity

use chrono::{DateTime, Duration, Utc};
use referral_core::DiscountView;
use serde::{Deserialize, Serialize};

/// One row per granted percentage-off reward.
///
/// Minted in pairs when a referral completes (one for each party);
/// deactivated, never deleted, on redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralDiscountEntity {
    /// Row id
    pub id: String,
    /// Owning user
    pub user_uid: String,
    /// Percentage off, validated 0-100
    pub discount_percentage: u8,
    /// Cleared on redemption
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Stamped on redemption
    pub applied_at: Option<DateTime<Utc>>,
    /// The referrer whose referral caused issuance
    pub referrer_uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReferralDiscountEntity {
    pub const TABLE: &'static str = "referral_discounts";

    pub fn new(user_uid: impl Into<String>, percentage: u8, validity_days: i64) -> Self {
        let now = Utc::now();
        let owner = user_uid.into();
        let id = format!(
            "{}:{}:{}",
            Self::TABLE,
            owner,
            now.timestamp_nanos_opt().unwrap_or(0)
        );
        Self {
            id,
            user_uid: owner,
            discount_percentage: percentage,
            is_active: true,
            expires_at: Some(now + Duration::days(validity_days)),
            applied_at: None,
            referrer_uid: None,
            created_at: now,
        }
    }

    pub fn with_referrer(mut self, referrer_uid: impl Into<String>) -> Self {
        self.referrer_uid = Some(referrer_uid.into());
        self
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| expiry > now)
    }

    /// Project into the pure price-computation view.
    pub fn to_view(&self) -> DiscountView {
        DiscountView {
            id: self.id.clone(),
            percentage: self.discount_percentage,
            is_active: self.is_active,
            expires_at: self.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_discount_is_eligible_for_its_lifetime() {
        let discount = ReferralDiscountEntity::new("user_b", 15, 30);
        assert!(discount.is_eligible(Utc::now()));
        assert!(!discount.is_eligible(Utc::now() + Duration::days(31)));
    }

    #[test]
    fn test_view_projection() {
        let discount = ReferralDiscountEntity::new("user_b", 15, 30).with_referrer("user_a");
        let view = discount.to_view();
        assert_eq!(view.percentage, 15);
        assert!(view.is_active);
        assert_eq!(view.expires_at, discount.expires_at);
    }
}
