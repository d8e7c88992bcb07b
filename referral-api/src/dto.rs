//! Request and response types
//!
//! The wire shapes are decoupled from the storage entities so the
//! storefront contract can stay stable while rows evolve.

use chrono::{DateTime, Utc};
use referral_core::{LeaderboardEntry, ReferralAnalytics, ReferralError, Tier};
use referral_engine::{CompletedReferral, SignInReferral};
use referral_store::{
    ReferralActivityEntity, ReferralDiscountEntity, ReferralPurchaseEntity, ReferralUserEntity,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rejected referral, as shown to the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectionNotice {
    pub code: String,
    pub message: String,
}

impl From<&ReferralError> for RejectionNotice {
    fn from(err: &ReferralError) -> Self {
        Self {
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ capture ============

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// The URL the visitor entered on
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureResponse {
    /// `no_code` | `staged` | `rejected`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionNotice>,
}

// ============ users ============

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub referral_code: String,
    pub total_referrals: i64,
    pub total_earnings: Decimal,
    pub tier: Tier,
    pub tier_name: String,
    pub tier_icon: String,
    /// Referral count that unlocks the next tier, absent at the top
    pub next_tier_at: Option<u64>,
    pub total_purchases: i64,
    pub conversion_rate: Decimal,
    pub referred_by: Option<String>,
    pub is_referrer: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&ReferralUserEntity> for UserResponse {
    fn from(user: &ReferralUserEntity) -> Self {
        let referrals = user.total_referrals.max(0) as u64;
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            referral_code: user.referral_code.clone(),
            total_referrals: user.total_referrals,
            total_earnings: user.total_earnings,
            tier: user.tier,
            tier_name: user.tier.display_name().to_string(),
            tier_icon: user.tier.icon().to_string(),
            next_tier_at: Tier::progress_toward_next(referrals).map(|(_, needed)| needed),
            total_purchases: user.total_purchases,
            conversion_rate: user.conversion_rate,
            referred_by: user.referred_by.clone(),
            is_referrer: user.is_referrer,
            created_at: user.created_at,
        }
    }
}

// ============ sign-in ============

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralOutcome {
    /// `none` | `completed` | `rejected`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounts_minted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionNotice>,
}

impl From<&SignInReferral> for ReferralOutcome {
    fn from(referral: &SignInReferral) -> Self {
        match referral {
            SignInReferral::None => Self {
                status: "none".to_string(),
                discounts_minted: None,
                rejection: None,
            },
            SignInReferral::Completed(CompletedReferral {
                discounts_minted, ..
            }) => Self {
                status: "completed".to_string(),
                discounts_minted: Some(*discounts_minted),
                rejection: None,
            },
            SignInReferral::Rejected(err) => Self {
                status: "rejected".to_string(),
                discounts_minted: None,
                rejection: Some(err.into()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub user: UserResponse,
    pub referral: ReferralOutcome,
}

// ============ referral link / activities ============

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralLinkResponse {
    pub code: String,
    pub link: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub id: String,
    pub referee_email: String,
    pub referee_uid: Option<String>,
    pub status: String,
    pub reward_amount: Decimal,
    pub joined_at: DateTime<Utc>,
    pub first_purchase_at: Option<DateTime<Utc>>,
    pub purchase_count: i64,
    pub total_spend: Decimal,
}

impl From<&ReferralActivityEntity> for ActivityResponse {
    fn from(activity: &ReferralActivityEntity) -> Self {
        Self {
            id: activity.id.clone(),
            referee_email: activity.referee_email.clone(),
            referee_uid: activity.referee_uid.clone(),
            status: activity.status.as_str().to_string(),
            reward_amount: activity.reward_amount,
            joined_at: activity.joined_at,
            first_purchase_at: activity.first_purchase_at,
            purchase_count: activity.purchase_count,
            total_spend: activity.total_spend,
        }
    }
}

// ============ discounts ============

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscountResponse {
    pub id: String,
    pub percentage: u8,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub applied_at: Option<DateTime<Utc>>,
}

impl From<&ReferralDiscountEntity> for DiscountResponse {
    fn from(discount: &ReferralDiscountEntity) -> Self {
        Self {
            id: discount.id.clone(),
            percentage: discount.discount_percentage,
            is_active: discount.is_active,
            expires_at: discount.expires_at,
            applied_at: discount.applied_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceQuoteRequest {
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriceQuoteResponse {
    pub original_price: Decimal,
    pub final_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<DiscountResponse>,
}

// ============ purchases ============

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub product_id: String,
    pub product_name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub discount_id: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub id: String,
    pub amount: Decimal,
    pub discount_amount: Decimal,
    pub referrer_uid: Option<String>,
    pub purchased_at: DateTime<Utc>,
}

impl From<&ReferralPurchaseEntity> for PurchaseResponse {
    fn from(purchase: &ReferralPurchaseEntity) -> Self {
        Self {
            id: purchase.id.clone(),
            amount: purchase.amount,
            discount_amount: purchase.discount_amount,
            referrer_uid: purchase.referrer_uid.clone(),
            purchased_at: purchase.purchased_at,
        }
    }
}

// ============ dashboard ============

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub total_referrals: u64,
    pub total_conversions: u64,
    pub conversion_rate: Decimal,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
}

impl From<ReferralAnalytics> for AnalyticsResponse {
    fn from(analytics: ReferralAnalytics) -> Self {
        Self {
            total_referrals: analytics.total_referrals,
            total_conversions: analytics.total_conversions,
            conversion_rate: analytics.conversion_rate,
            total_revenue: analytics.total_revenue,
            average_order_value: analytics.average_order_value,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub uid: String,
    pub display_name: Option<String>,
    pub total_referrals: u64,
    pub tier: Tier,
    pub tier_icon: String,
}

impl From<&LeaderboardEntry> for LeaderboardRow {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            uid: entry.uid.as_str().to_string(),
            display_name: entry.display_name.clone(),
            total_referrals: entry.total_referrals,
            tier: entry.tier,
            tier_icon: entry.tier.icon().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardRow>,
}
