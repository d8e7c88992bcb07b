//! Purchase Repository

use async_trait::async_trait;

use crate::entities::ReferralPurchaseEntity;
use crate::error::StoreResult;

/// Row operations on `referral_purchases`.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn insert(&self, entity: ReferralPurchaseEntity)
        -> StoreResult<ReferralPurchaseEntity>;

    /// Purchases attributed to a referrer, for analytics.
    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralPurchaseEntity>>;

    /// Purchases made by a user.
    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralPurchaseEntity>>;
}
