//! Analytics Service
//!
//! Read-only aggregation for one referrer's dashboard. An unreachable
//! store degrades to empty inputs - the dashboard renders zeros, it
//! never crashes.

use std::sync::Arc;

use referral_core::{compute_analytics, ActivitySnapshot, PurchaseSnapshot, ReferralAnalytics};
use referral_store::{ActivityRepository, PurchaseRepository};
use tracing::warn;

/// Derives conversion and revenue figures for a referrer.
pub struct AnalyticsService {
    activities: Arc<dyn ActivityRepository>,
    purchases: Arc<dyn PurchaseRepository>,
}

impl AnalyticsService {
    pub fn new(
        activities: Arc<dyn ActivityRepository>,
        purchases: Arc<dyn PurchaseRepository>,
    ) -> Self {
        Self {
            activities,
            purchases,
        }
    }

    /// Compute analytics for a referrer from their activity and
    /// purchase rows.
    pub async fn compute(&self, referrer_uid: &str) -> ReferralAnalytics {
        let activities = match self.activities.list_for_referrer(referrer_uid).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(uid = %referrer_uid, %err, "activity read failed, defaulting to empty");
                Vec::new()
            }
        };
        let purchases = match self.purchases.list_for_referrer(referrer_uid).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(uid = %referrer_uid, %err, "purchase read failed, defaulting to empty");
                Vec::new()
            }
        };

        let activity_views: Vec<ActivitySnapshot> = activities
            .iter()
            .map(|a| ActivitySnapshot {
                first_purchase_at: a.first_purchase_at,
            })
            .collect();
        let purchase_views: Vec<PurchaseSnapshot> = purchases
            .iter()
            .map(|p| PurchaseSnapshot { amount: p.amount })
            .collect();

        compute_analytics(&activity_views, &purchase_views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use referral_store::{MemoryStore, ReferralActivityEntity, ReferralPurchaseEntity};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_analytics_over_store_rows() {
        let store = Arc::new(MemoryStore::new());

        let mut converted =
            ReferralActivityEntity::new("user_a", "b@example.com", Decimal::new(25, 0));
        converted.record_purchase(Decimal::new(3000, 2), Utc::now());
        ActivityRepository::insert(store.as_ref(), converted)
            .await
            .unwrap();
        ActivityRepository::insert(
            store.as_ref(),
            ReferralActivityEntity::new("user_a", "c@example.com", Decimal::new(25, 0)),
        )
        .await
        .unwrap();

        PurchaseRepository::insert(
            store.as_ref(),
            ReferralPurchaseEntity::new("user_b", "prod_001", "Desk Lamp", Decimal::new(3000, 2))
                .with_referrer("user_a"),
        )
        .await
        .unwrap();

        let service = AnalyticsService::new(store.clone(), store);
        let analytics = service.compute("user_a").await;

        assert_eq!(analytics.total_referrals, 2);
        assert_eq!(analytics.total_conversions, 1);
        assert_eq!(analytics.conversion_rate, Decimal::new(50, 0));
        assert_eq!(analytics.total_revenue, Decimal::new(3000, 2));
        assert_eq!(analytics.average_order_value, Decimal::new(3000, 2));
    }

    #[tokio::test]
    async fn test_unknown_referrer_yields_zeros() {
        let store = Arc::new(MemoryStore::new());
        let service = AnalyticsService::new(store.clone(), store);
        let analytics = service.compute("user_nobody").await;
        assert_eq!(analytics, ReferralAnalytics::empty());
    }
}
