//! In-Memory Store
//!
//! Implements all four repositories over `RwLock`-guarded maps. This is
//! the backend for tests and local development, and it enforces the
//! same unique constraints as the SQL schema so the engine sees
//! identical failure behavior from either backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use referral_core::Tier;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::entities::{
    ReferralActivityEntity, ReferralDiscountEntity, ReferralPurchaseEntity, ReferralUserEntity,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::{ActivityRepository, DiscountRepository, PurchaseRepository, UserRepository};

/// In-memory row store.
#[derive(Default)]
pub struct MemoryStore {
    /// Users keyed by uid
    users: RwLock<HashMap<String, ReferralUserEntity>>,
    /// Activities keyed by row id
    activities: RwLock<HashMap<String, ReferralActivityEntity>>,
    /// Discounts keyed by row id
    discounts: RwLock<HashMap<String, ReferralDiscountEntity>>,
    /// Purchases, append-only
    purchases: RwLock<Vec<ReferralPurchaseEntity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, entity: ReferralUserEntity) -> StoreResult<ReferralUserEntity> {
        let mut users = self.users.write().await;
        if users.contains_key(&entity.uid) {
            return Err(StoreError::unique_violation("referral_users.uid"));
        }
        if users
            .values()
            .any(|u| u.referral_code == entity.referral_code)
        {
            return Err(StoreError::unique_violation("referral_users.referral_code"));
        }
        users.insert(entity.uid.clone(), entity.clone());
        Ok(entity)
    }

    async fn get_by_uid(&self, uid: &str) -> StoreResult<Option<ReferralUserEntity>> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ReferralUserEntity>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.referral_code == code)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<ReferralUserEntity>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_stats(
        &self,
        uid: &str,
        total_referrals: i64,
        total_earnings: Decimal,
        tier: Tier,
    ) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("ReferralUser", uid))?;
        user.total_referrals = total_referrals;
        user.total_earnings = total_earnings;
        user.tier = tier;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_purchase_stats(
        &self,
        uid: &str,
        total_purchases: i64,
        conversion_rate: Decimal,
    ) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("ReferralUser", uid))?;
        user.total_purchases = total_purchases;
        user.conversion_rate = conversion_rate;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_referred_by(&self, uid: &str, referrer_uid: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("ReferralUser", uid))?;
        // set once; a repeat stamp leaves the original untouched
        if user.referred_by.is_none() {
            user.referred_by = Some(referrer_uid.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_is_referrer(&self, uid: &str, is_referrer: bool) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| StoreError::not_found("ReferralUser", uid))?;
        user.is_referrer = is_referrer;
        Ok(())
    }

    async fn top_referrers(&self, limit: usize) -> StoreResult<Vec<ReferralUserEntity>> {
        let users = self.users.read().await;
        let mut referrers: Vec<ReferralUserEntity> = users
            .values()
            .filter(|u| u.total_referrals > 0)
            .cloned()
            .collect();
        // uid tie-break keeps the ordering deterministic across reads
        referrers.sort_by(|a, b| {
            b.total_referrals
                .cmp(&a.total_referrals)
                .then_with(|| a.uid.cmp(&b.uid))
        });
        referrers.truncate(limit);
        Ok(referrers)
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn insert(&self, entity: ReferralActivityEntity) -> StoreResult<ReferralActivityEntity> {
        let mut activities = self.activities.write().await;
        if activities
            .values()
            .any(|a| a.referee_email == entity.referee_email)
        {
            return Err(StoreError::unique_violation(
                "referral_activities.referee_email",
            ));
        }
        activities.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    async fn get_by_referee_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<ReferralActivityEntity>> {
        Ok(self
            .activities
            .read()
            .await
            .values()
            .find(|a| a.referee_email == email)
            .cloned())
    }

    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralActivityEntity>> {
        let activities = self.activities.read().await;
        let mut rows: Vec<ReferralActivityEntity> = activities
            .values()
            .filter(|a| a.referrer_uid == referrer_uid)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(rows)
    }

    async fn update(&self, entity: &ReferralActivityEntity) -> StoreResult<()> {
        let mut activities = self.activities.write().await;
        match activities.get_mut(&entity.id) {
            Some(row) => {
                *row = entity.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("ReferralActivity", &entity.id)),
        }
    }
}

#[async_trait]
impl DiscountRepository for MemoryStore {
    async fn insert(&self, entity: ReferralDiscountEntity) -> StoreResult<ReferralDiscountEntity> {
        let mut discounts = self.discounts.write().await;
        discounts.insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ReferralDiscountEntity>> {
        Ok(self.discounts.read().await.get(id).cloned())
    }

    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralDiscountEntity>> {
        let discounts = self.discounts.read().await;
        let mut rows: Vec<ReferralDiscountEntity> = discounts
            .values()
            .filter(|d| d.user_uid == uid)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn deactivate(&self, id: &str, applied_at: DateTime<Utc>) -> StoreResult<()> {
        let mut discounts = self.discounts.write().await;
        let discount = discounts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("ReferralDiscount", id))?;
        if discount.is_active {
            discount.is_active = false;
            discount.applied_at = Some(applied_at);
        }
        Ok(())
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn insert(
        &self,
        entity: ReferralPurchaseEntity,
    ) -> StoreResult<ReferralPurchaseEntity> {
        self.purchases.write().await.push(entity.clone());
        Ok(entity)
    }

    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralPurchaseEntity>> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .filter(|p| p.referrer_uid.as_deref() == Some(referrer_uid))
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralPurchaseEntity>> {
        Ok(self
            .purchases
            .read()
            .await
            .iter()
            .filter(|p| p.purchaser_uid == uid)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_core::{Principal, ReferralCode};

    fn user(uid: &str, email: &str, code: &str) -> ReferralUserEntity {
        ReferralUserEntity::new(&Principal::new(uid, email), &ReferralCode::new(code))
    }

    #[tokio::test]
    async fn test_duplicate_referral_code_rejected() {
        let store = MemoryStore::new();
        store
            .create(user("user_a", "a@example.com", "AAAA1111"))
            .await
            .unwrap();

        let err = store
            .create(user("user_b", "b@example.com", "AAAA1111"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_duplicate_referee_email_rejected() {
        let store = MemoryStore::new();
        ActivityRepository::insert(
            &store,
            ReferralActivityEntity::new("user_a", "b@example.com", Decimal::new(25, 0)),
        )
        .await
        .unwrap();

        let err = ActivityRepository::insert(
            &store,
            ReferralActivityEntity::new("user_c", "b@example.com", Decimal::new(25, 0)),
        )
        .await
        .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_referred_by_is_set_once() {
        let store = MemoryStore::new();
        store
            .create(user("user_b", "b@example.com", "BBBB2222"))
            .await
            .unwrap();

        store.set_referred_by("user_b", "user_a").await.unwrap();
        store.set_referred_by("user_b", "user_z").await.unwrap();

        let row = store.get_by_uid("user_b").await.unwrap().unwrap();
        assert_eq!(row.referred_by.as_deref(), Some("user_a"));
    }

    #[tokio::test]
    async fn test_deactivate_is_idempotent() {
        let store = MemoryStore::new();
        let discount = DiscountRepository::insert(
            &store,
            ReferralDiscountEntity::new("user_b", 15, 30),
        )
        .await
        .unwrap();

        let first = Utc::now();
        store.deactivate(&discount.id, first).await.unwrap();
        store.deactivate(&discount.id, Utc::now()).await.unwrap();

        let row = store.get(&discount.id).await.unwrap().unwrap();
        assert!(!row.is_active);
        assert_eq!(row.applied_at, Some(first));
    }

    #[tokio::test]
    async fn test_top_referrers_ordering() {
        let store = MemoryStore::new();
        for (uid, email, code, count) in [
            ("user_a", "a@example.com", "AAAA1111", 3),
            ("user_b", "b@example.com", "BBBB2222", 9),
            ("user_c", "c@example.com", "CCCC3333", 0),
        ] {
            let mut entity = user(uid, email, code);
            entity.total_referrals = count;
            store.create(entity).await.unwrap();
        }

        let top = store.top_referrers(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].uid, "user_b");
        assert_eq!(top[1].uid, "user_a");
    }
}
