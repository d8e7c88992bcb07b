//! Activity Repository

use async_trait::async_trait;

use crate::entities::ReferralActivityEntity;
use crate::error::StoreResult;

/// Row operations on `referral_activities`.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert a new activity.
    ///
    /// The unique index on `referee_email` makes this the duplicate
    /// gate: a second insert for the same email fails with
    /// `UniqueViolation` no matter how the callers raced.
    async fn insert(&self, entity: ReferralActivityEntity) -> StoreResult<ReferralActivityEntity>;

    /// The activity for a referee email, if one exists.
    async fn get_by_referee_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<ReferralActivityEntity>>;

    /// All activities where the given user is the referrer.
    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralActivityEntity>>;

    /// Persist an updated activity row (purchase rollups, referee uid).
    async fn update(&self, entity: &ReferralActivityEntity) -> StoreResult<()>;
}
