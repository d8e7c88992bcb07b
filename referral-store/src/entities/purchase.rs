//! Referral Purchase Entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row per tracked purchase event.
///
/// Read-only after creation; feeds analytics aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralPurchaseEntity {
    /// Row id
    pub id: String,
    pub purchaser_uid: String,
    /// The purchaser's referrer, when they were referred
    pub referrer_uid: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub amount: Decimal,
    /// Money taken off by an applied discount
    pub discount_amount: Decimal,
    /// Link to the originating activity, when any
    pub activity_id: Option<String>,
    pub purchased_at: DateTime<Utc>,
}

impl ReferralPurchaseEntity {
    pub const TABLE: &'static str = "referral_purchases";

    pub fn new(
        purchaser_uid: impl Into<String>,
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        let purchaser = purchaser_uid.into();
        let id = format!(
            "{}:{}:{}",
            Self::TABLE,
            purchaser,
            now.timestamp_nanos_opt().unwrap_or(0)
        );
        Self {
            id,
            purchaser_uid: purchaser,
            referrer_uid: None,
            product_id: product_id.into(),
            product_name: product_name.into(),
            amount,
            discount_amount: Decimal::ZERO,
            activity_id: None,
            purchased_at: now,
        }
    }

    pub fn with_referrer(mut self, referrer_uid: impl Into<String>) -> Self {
        self.referrer_uid = Some(referrer_uid.into());
        self
    }

    pub fn with_discount_amount(mut self, discount_amount: Decimal) -> Self {
        self.discount_amount = discount_amount;
        self
    }

    pub fn with_activity(mut self, activity_id: impl Into<String>) -> Self {
        self.activity_id = Some(activity_id.into());
        self
    }
}
