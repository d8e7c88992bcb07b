//! User Repository

use async_trait::async_trait;
use referral_core::Tier;
use rust_decimal::Decimal;

use crate::entities::ReferralUserEntity;
use crate::error::StoreResult;

/// Row operations on `referral_users`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user row.
    ///
    /// Fails with a unique violation when the referral code is already
    /// taken; callers regenerate the code and retry.
    async fn create(&self, entity: ReferralUserEntity) -> StoreResult<ReferralUserEntity>;

    /// Look up by external uid.
    async fn get_by_uid(&self, uid: &str) -> StoreResult<Option<ReferralUserEntity>>;

    /// Look up by referral code.
    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ReferralUserEntity>>;

    /// Look up by normalized email.
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<ReferralUserEntity>>;

    /// Persist referral stats (count, earnings, derived tier).
    async fn update_stats(
        &self,
        uid: &str,
        total_referrals: i64,
        total_earnings: Decimal,
        tier: Tier,
    ) -> StoreResult<()>;

    /// Persist purchase-side stats.
    async fn update_purchase_stats(
        &self,
        uid: &str,
        total_purchases: i64,
        conversion_rate: Decimal,
    ) -> StoreResult<()>;

    /// Stamp the back-reference to the referrer.
    ///
    /// Set once: a row that already carries `referred_by` is left
    /// untouched, so a second stamp attempt is harmless.
    async fn set_referred_by(&self, uid: &str, referrer_uid: &str) -> StoreResult<()>;

    /// Flip the derived referrer flag.
    async fn set_is_referrer(&self, uid: &str, is_referrer: bool) -> StoreResult<()>;

    /// Users with at least one referral, descending by count.
    async fn top_referrers(&self, limit: usize) -> StoreResult<Vec<ReferralUserEntity>>;
}
