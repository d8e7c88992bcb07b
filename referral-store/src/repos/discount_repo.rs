//! Discount Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::ReferralDiscountEntity;
use crate::error::StoreResult;

/// Row operations on `referral_discounts`.
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    async fn insert(&self, entity: ReferralDiscountEntity) -> StoreResult<ReferralDiscountEntity>;

    async fn get(&self, id: &str) -> StoreResult<Option<ReferralDiscountEntity>>;

    /// Every discount owned by a user, active or not.
    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralDiscountEntity>>;

    /// Clear the active flag and stamp the redemption time.
    ///
    /// Deactivating an already-inactive discount is a no-op, which is
    /// what makes redemption idempotent.
    async fn deactivate(&self, id: &str, applied_at: DateTime<Utc>) -> StoreResult<()>;
}
