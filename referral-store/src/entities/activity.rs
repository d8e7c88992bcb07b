//! Referral Activity Entity

use chrono::{DateTime, Utc};
use referral_core::ActivityStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row per successful referral (referrer x referee pair).
///
/// At most one activity may ever exist per distinct referee email;
/// the store's unique index on `referee_email` enforces it. Created
/// exactly once, then updated in place as the referee purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralActivityEntity {
    /// Row id
    pub id: String,
    /// The user whose code was used
    pub referrer_uid: String,
    /// The invited party, once authenticated
    pub referee_uid: Option<String>,
    /// Normalized referee email; the duplicate-detection identity
    pub referee_email: String,
    pub status: ActivityStatus,
    /// Reward earned by the referrer for this referral
    pub reward_amount: Decimal,
    /// When the referee joined via the link
    pub joined_at: DateTime<Utc>,
    /// The conversion: the referee's first purchase
    pub first_purchase_at: Option<DateTime<Utc>>,
    /// Cumulative purchases by the referee
    pub purchase_count: i64,
    /// Cumulative spend by the referee
    pub total_spend: Decimal,
}

impl ReferralActivityEntity {
    pub const TABLE: &'static str = "referral_activities";

    pub fn new(
        referrer_uid: impl Into<String>,
        referee_email: impl Into<String>,
        reward_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        let referrer = referrer_uid.into();
        let id = format!(
            "{}:{}:{}",
            Self::TABLE,
            referrer,
            now.timestamp_nanos_opt().unwrap_or(0)
        );
        Self {
            id,
            referrer_uid: referrer,
            referee_uid: None,
            referee_email: referee_email.into(),
            status: ActivityStatus::Completed,
            reward_amount,
            joined_at: now,
            first_purchase_at: None,
            purchase_count: 0,
            total_spend: Decimal::ZERO,
        }
    }

    pub fn with_referee_uid(mut self, referee_uid: impl Into<String>) -> Self {
        self.referee_uid = Some(referee_uid.into());
        self
    }

    /// Fold one referee purchase into the activity.
    ///
    /// The first call stamps the conversion timestamp; later calls only
    /// bump the count and spend.
    pub fn record_purchase(&mut self, amount: Decimal, at: DateTime<Utc>) {
        if self.first_purchase_at.is_none() {
            self.first_purchase_at = Some(at);
        }
        self.purchase_count += 1;
        self.total_spend += amount;
    }

    /// True once the referee has made a first purchase.
    pub fn is_converted(&self) -> bool {
        self.first_purchase_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_purchase_stamps_conversion_once() {
        let mut activity =
            ReferralActivityEntity::new("user_a", "b@example.com", Decimal::new(25, 0));
        assert!(!activity.is_converted());

        let first = Utc::now();
        activity.record_purchase(Decimal::new(30, 0), first);
        assert_eq!(activity.first_purchase_at, Some(first));

        activity.record_purchase(Decimal::new(20, 0), Utc::now());
        assert_eq!(activity.first_purchase_at, Some(first));
        assert_eq!(activity.purchase_count, 2);
        assert_eq!(activity.total_spend, Decimal::new(50, 0));
    }
}
