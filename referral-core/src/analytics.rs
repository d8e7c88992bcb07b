//! Referrer Analytics
//!
//! Read-side aggregation over a referrer's activities and purchases,
//! and the leaderboard ranking rule. Derived entirely from the rows
//! passed in; no caching contract beyond the caller's refresh cadence.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tier::Tier;
use crate::types::UserId;

/// The slice of an activity row that analytics needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySnapshot {
    /// Set once the referee makes their first purchase
    pub first_purchase_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// The slice of a purchase row that analytics needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSnapshot {
    pub amount: Decimal,
}

/// Derived analytics for a single referrer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralAnalytics {
    pub total_referrals: u64,
    /// Referrals whose referee has made a first purchase
    pub total_conversions: u64,
    /// `conversions / referrals * 100`, 0 with no referrals
    pub conversion_rate: Decimal,
    pub total_revenue: Decimal,
    /// `revenue / conversions`, 0 with no conversions
    pub average_order_value: Decimal,
}

impl ReferralAnalytics {
    pub fn empty() -> Self {
        Self {
            total_referrals: 0,
            total_conversions: 0,
            conversion_rate: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            average_order_value: Decimal::ZERO,
        }
    }
}

/// Compute analytics from a referrer's activity and purchase rows.
pub fn compute_analytics(
    activities: &[ActivitySnapshot],
    purchases: &[PurchaseSnapshot],
) -> ReferralAnalytics {
    let total_referrals = activities.len() as u64;
    let total_conversions = activities
        .iter()
        .filter(|a| a.first_purchase_at.is_some())
        .count() as u64;

    let conversion_rate = if total_referrals == 0 {
        Decimal::ZERO
    } else {
        (Decimal::from(total_conversions) * Decimal::ONE_HUNDRED / Decimal::from(total_referrals))
            .round_dp(2)
    };

    let total_revenue = purchases
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc + p.amount);

    let average_order_value = if total_conversions == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(total_conversions)).round_dp(2)
    };

    ReferralAnalytics {
        total_referrals,
        total_conversions,
        conversion_rate,
        total_revenue,
        average_order_value,
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub total_referrals: u64,
    pub tier: Tier,
}

/// Rank referrers for the leaderboard.
///
/// Users with no referrals are excluded; the rest are ordered by
/// descending referral count and truncated to `limit`. The sort is
/// stable, so equal counts keep the store's ordering.
pub fn rank_referrers(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.retain(|e| e.total_referrals > 0);
    entries.sort_by(|a, b| b.total_referrals.cmp(&a.total_referrals));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn converted() -> ActivitySnapshot {
        ActivitySnapshot {
            first_purchase_at: Some(Utc::now()),
        }
    }

    fn unconverted() -> ActivitySnapshot {
        ActivitySnapshot {
            first_purchase_at: None,
        }
    }

    #[test]
    fn test_empty_inputs_are_all_zero() {
        let analytics = compute_analytics(&[], &[]);
        assert_eq!(analytics, ReferralAnalytics::empty());
    }

    #[test]
    fn test_conversion_rate() {
        let activities = vec![converted(), unconverted(), converted(), unconverted()];
        let analytics = compute_analytics(&activities, &[]);
        assert_eq!(analytics.total_referrals, 4);
        assert_eq!(analytics.total_conversions, 2);
        assert_eq!(analytics.conversion_rate, Decimal::new(50, 0));
    }

    #[test]
    fn test_revenue_and_average_order_value() {
        let activities = vec![converted(), converted()];
        let purchases = vec![
            PurchaseSnapshot {
                amount: Decimal::new(3000, 2),
            },
            PurchaseSnapshot {
                amount: Decimal::new(4500, 2),
            },
        ];
        let analytics = compute_analytics(&activities, &purchases);
        assert_eq!(analytics.total_revenue, Decimal::new(7500, 2));
        assert_eq!(analytics.average_order_value, Decimal::new(3750, 2));
    }

    #[test]
    fn test_no_conversions_means_zero_average() {
        let analytics = compute_analytics(
            &[unconverted()],
            &[PurchaseSnapshot {
                amount: Decimal::new(100, 0),
            }],
        );
        assert_eq!(analytics.average_order_value, Decimal::ZERO);
    }

    fn entry(uid: &str, total: u64) -> LeaderboardEntry {
        LeaderboardEntry {
            uid: UserId::new(uid),
            display_name: None,
            total_referrals: total,
            tier: Tier::for_referrals(total),
        }
    }

    #[test]
    fn test_leaderboard_orders_and_truncates() {
        let ranked = rank_referrers(
            vec![entry("a", 2), entry("b", 9), entry("c", 0), entry("d", 5)],
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].uid.as_str(), "b");
        assert_eq!(ranked[1].uid.as_str(), "d");
    }

    #[test]
    fn test_leaderboard_excludes_zero_referrals() {
        let ranked = rank_referrers(vec![entry("quiet", 0)], 10);
        assert!(ranked.is_empty());
    }
}
