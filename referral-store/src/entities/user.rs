//! Referral User Entity

use chrono::{DateTime, Utc};
use referral_core::{Principal, ReferralCode, Tier};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row per authenticated principal.
///
/// Created on first successful sign-in, mutated by referral completion
/// and purchase tracking, never deleted by this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralUserEntity {
    /// Row id
    pub id: String,
    /// External id from the authentication collaborator
    pub uid: String,
    /// Normalized email
    pub email: String,
    /// Display name, when the auth provider supplies one
    pub display_name: Option<String>,
    /// Unique shareable code
    pub referral_code: String,
    /// Completed referrals; monotonically non-decreasing
    pub total_referrals: i64,
    /// Accrued reward money
    pub total_earnings: Decimal,
    /// Derived from `total_referrals`, recomputed on every stat change
    pub tier: Tier,
    /// Purchases made by this user
    pub total_purchases: i64,
    /// Percentage of this user's referrals that converted
    pub conversion_rate: Decimal,
    /// The user who referred this one; set once, immutable thereafter
    pub referred_by: Option<String>,
    /// True iff at least one activity names this user as referrer
    pub is_referrer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReferralUserEntity {
    pub const TABLE: &'static str = "referral_users";

    /// Create a fresh user row for a principal.
    pub fn new(principal: &Principal, code: &ReferralCode) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}:{}", Self::TABLE, principal.uid.as_str()),
            uid: principal.uid.as_str().to_string(),
            email: principal.email.as_str().to_string(),
            display_name: principal.display_name.clone(),
            referral_code: code.as_str().to_string(),
            total_referrals: 0,
            total_earnings: Decimal::ZERO,
            tier: Tier::Bronze,
            total_purchases: 0,
            conversion_rate: Decimal::ZERO,
            referred_by: None,
            is_referrer: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_referred_by(mut self, referrer_uid: impl Into<String>) -> Self {
        self.referred_by = Some(referrer_uid.into());
        self
    }

    /// Apply one completed referral to the stats.
    ///
    /// Callers persist the new values and must discard this entity if
    /// persistence ultimately fails - stats reflect only confirmed
    /// writes.
    pub fn record_referral(&mut self, reward: Decimal) {
        self.total_referrals += 1;
        self.total_earnings += reward;
        self.tier = Tier::for_referrals(self.total_referrals.max(0) as u64);
        self.is_referrer = true;
        self.updated_at = Utc::now();
    }

    /// Apply one purchase by this user.
    pub fn record_purchase(&mut self) {
        self.total_purchases += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_principal() -> Principal {
        Principal::new("user_a", "a@example.com").with_display_name("Ada")
    }

    #[test]
    fn test_new_user_starts_at_bronze() {
        let user = ReferralUserEntity::new(&test_principal(), &ReferralCode::new("ABC12345"));
        assert_eq!(user.tier, Tier::Bronze);
        assert_eq!(user.total_referrals, 0);
        assert_eq!(user.total_earnings, Decimal::ZERO);
        assert!(!user.is_referrer);
    }

    #[test]
    fn test_record_referral_accrues_and_retiers() {
        let mut user = ReferralUserEntity::new(&test_principal(), &ReferralCode::new("ABC12345"));
        for _ in 0..5 {
            user.record_referral(Decimal::new(25, 0));
        }
        assert_eq!(user.total_referrals, 5);
        assert_eq!(user.total_earnings, Decimal::new(125, 0));
        assert_eq!(user.tier, Tier::Silver);
        assert!(user.is_referrer);
    }
}
