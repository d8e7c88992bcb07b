//! REST Row-Store Client
//!
//! The hosted relational store exposes each table as a REST resource:
//! `GET {base}/{table}?col=eq.value` selects, `POST {base}/{table}`
//! inserts, `PATCH {base}/{table}?col=eq.value` updates. This client
//! implements the four repositories over that contract.
//!
//! Reads and updates retry transient transport failures with a bounded
//! exponential backoff; inserts are attempted once, since the caller
//! cannot tell whether a timed-out insert landed. A 409 from the store
//! is a unique-constraint rejection and maps to
//! [`StoreError::UniqueViolation`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use referral_core::Tier;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::entities::{
    ReferralActivityEntity, ReferralDiscountEntity, ReferralPurchaseEntity, ReferralUserEntity,
};
use crate::error::{StoreError, StoreResult};
use crate::repos::{ActivityRepository, DiscountRepository, PurchaseRepository, UserRepository};

/// Retry configuration for transient transport failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retries
    pub max_retries: u32,
    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
            multiplier: 2.0,
        }
    }
}

/// Connection settings for the REST row store.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL, e.g. `https://project.example.co/rest/v1`
    pub base_url: String,
    /// API key sent as `apikey` and bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl RestConfig {
    /// Read the connection settings from the environment.
    ///
    /// Returns `None` when `REFERRAL_STORE_URL` is unset, in which case
    /// callers fall back to the in-memory backend.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("REFERRAL_STORE_URL").ok()?;
        let api_key = std::env::var("REFERRAL_STORE_API_KEY").ok();
        Some(Self {
            base_url,
            api_key,
            timeout_secs: 30,
            retry: RetryConfig::default(),
        })
    }
}

/// REST implementation of the four repositories.
pub struct RestRowStore {
    base_url: String,
    client: reqwest::Client,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl RestRowStore {
    pub fn new(config: RestConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            api_key: config.api_key,
            retry: config.retry,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    /// Execute an operation with retry on transport failures.
    async fn execute_with_retry<T, F, Fut>(&self, operation: F) -> StoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        let mut last_error = StoreError::Connection("No attempts made".to_string());
        let mut backoff_ms = self.retry.initial_backoff_ms;

        for attempt in 0..=self.retry.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err @ StoreError::Connection(_)) => {
                    last_error = err;
                    if attempt < self.retry.max_retries {
                        tracing::debug!(attempt, backoff_ms, "transport error, backing off");
                        tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                        backoff_ms = std::cmp::min(
                            (backoff_ms as f64 * self.retry.multiplier) as u64,
                            self.retry.max_backoff_ms,
                        );
                    }
                }
                // non-transient errors are not worth repeating
                Err(err) => return Err(err),
            }
        }

        Err(last_error)
    }

    async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::unique_violation(body));
        }
        Err(StoreError::Database(format!(
            "store returned {}: {}",
            status, body
        )))
    }

    async fn try_select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let request = self.authorize(self.client.get(self.table_url(table)).query(params));
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        self.execute_with_retry(|| self.try_select(table, params))
            .await
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> StoreResult<Option<T>> {
        let mut rows = self.select(table, params).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    /// Insert a row and return the stored representation.
    ///
    /// Single attempt: a retried insert that actually landed would
    /// duplicate the row.
    async fn insert_row<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
    ) -> StoreResult<T> {
        let request = self.authorize(
            self.client
                .post(self.table_url(table))
                .header("Prefer", "return=representation")
                .json(row),
        );
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let response = Self::check_status(response).await?;
        let mut rows: Vec<T> = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if rows.is_empty() {
            return Err(StoreError::Database(
                "insert returned no representation".to_string(),
            ));
        }
        Ok(rows.remove(0))
    }

    async fn try_patch(
        &self,
        table: &str,
        params: &[(&str, String)],
        patch: &serde_json::Value,
    ) -> StoreResult<()> {
        let request = self.authorize(
            self.client
                .patch(self.table_url(table))
                .query(params)
                .json(patch),
        );
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn patch(
        &self,
        table: &str,
        params: &[(&str, String)],
        patch: serde_json::Value,
    ) -> StoreResult<()> {
        self.execute_with_retry(|| self.try_patch(table, params, &patch))
            .await
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl UserRepository for RestRowStore {
    async fn create(&self, entity: ReferralUserEntity) -> StoreResult<ReferralUserEntity> {
        self.insert_row(ReferralUserEntity::TABLE, &entity).await
    }

    async fn get_by_uid(&self, uid: &str) -> StoreResult<Option<ReferralUserEntity>> {
        self.select_one(ReferralUserEntity::TABLE, &[("uid", eq(uid))])
            .await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<ReferralUserEntity>> {
        self.select_one(ReferralUserEntity::TABLE, &[("referral_code", eq(code))])
            .await
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<ReferralUserEntity>> {
        self.select_one(ReferralUserEntity::TABLE, &[("email", eq(email))])
            .await
    }

    async fn update_stats(
        &self,
        uid: &str,
        total_referrals: i64,
        total_earnings: Decimal,
        tier: Tier,
    ) -> StoreResult<()> {
        self.patch(
            ReferralUserEntity::TABLE,
            &[("uid", eq(uid))],
            json!({
                "total_referrals": total_referrals,
                "total_earnings": total_earnings,
                "tier": tier,
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    async fn update_purchase_stats(
        &self,
        uid: &str,
        total_purchases: i64,
        conversion_rate: Decimal,
    ) -> StoreResult<()> {
        self.patch(
            ReferralUserEntity::TABLE,
            &[("uid", eq(uid))],
            json!({
                "total_purchases": total_purchases,
                "conversion_rate": conversion_rate,
                "updated_at": Utc::now(),
            }),
        )
        .await
    }

    async fn set_referred_by(&self, uid: &str, referrer_uid: &str) -> StoreResult<()> {
        // the is.null filter makes the stamp one-time on the store side
        self.patch(
            ReferralUserEntity::TABLE,
            &[("uid", eq(uid)), ("referred_by", "is.null".to_string())],
            json!({ "referred_by": referrer_uid, "updated_at": Utc::now() }),
        )
        .await
    }

    async fn set_is_referrer(&self, uid: &str, is_referrer: bool) -> StoreResult<()> {
        self.patch(
            ReferralUserEntity::TABLE,
            &[("uid", eq(uid))],
            json!({ "is_referrer": is_referrer }),
        )
        .await
    }

    async fn top_referrers(&self, limit: usize) -> StoreResult<Vec<ReferralUserEntity>> {
        self.select(
            ReferralUserEntity::TABLE,
            &[
                ("total_referrals", "gt.0".to_string()),
                ("order", "total_referrals.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl ActivityRepository for RestRowStore {
    async fn insert(&self, entity: ReferralActivityEntity) -> StoreResult<ReferralActivityEntity> {
        self.insert_row(ReferralActivityEntity::TABLE, &entity).await
    }

    async fn get_by_referee_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<ReferralActivityEntity>> {
        self.select_one(ReferralActivityEntity::TABLE, &[("referee_email", eq(email))])
            .await
    }

    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralActivityEntity>> {
        self.select(
            ReferralActivityEntity::TABLE,
            &[
                ("referrer_uid", eq(referrer_uid)),
                ("order", "joined_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn update(&self, entity: &ReferralActivityEntity) -> StoreResult<()> {
        let patch = serde_json::to_value(entity)?;
        self.patch(
            ReferralActivityEntity::TABLE,
            &[("id", eq(&entity.id))],
            patch,
        )
        .await
    }
}

#[async_trait]
impl DiscountRepository for RestRowStore {
    async fn insert(&self, entity: ReferralDiscountEntity) -> StoreResult<ReferralDiscountEntity> {
        self.insert_row(ReferralDiscountEntity::TABLE, &entity).await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ReferralDiscountEntity>> {
        self.select_one(ReferralDiscountEntity::TABLE, &[("id", eq(id))])
            .await
    }

    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralDiscountEntity>> {
        self.select(
            ReferralDiscountEntity::TABLE,
            &[
                ("user_uid", eq(uid)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn deactivate(&self, id: &str, applied_at: DateTime<Utc>) -> StoreResult<()> {
        // filtering on is_active keeps the first applied_at stamp
        self.patch(
            ReferralDiscountEntity::TABLE,
            &[("id", eq(id)), ("is_active", "eq.true".to_string())],
            json!({ "is_active": false, "applied_at": applied_at }),
        )
        .await
    }
}

#[async_trait]
impl PurchaseRepository for RestRowStore {
    async fn insert(
        &self,
        entity: ReferralPurchaseEntity,
    ) -> StoreResult<ReferralPurchaseEntity> {
        self.insert_row(ReferralPurchaseEntity::TABLE, &entity).await
    }

    async fn list_for_referrer(
        &self,
        referrer_uid: &str,
    ) -> StoreResult<Vec<ReferralPurchaseEntity>> {
        self.select(
            ReferralPurchaseEntity::TABLE,
            &[("referrer_uid", eq(referrer_uid))],
        )
        .await
    }

    async fn list_for_user(&self, uid: &str) -> StoreResult<Vec<ReferralPurchaseEntity>> {
        self.select(
            ReferralPurchaseEntity::TABLE,
            &[("purchaser_uid", eq(uid))],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert!(config.initial_backoff_ms < config.max_backoff_ms);
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let store = RestRowStore::new(RestConfig {
            base_url: "https://store.example.com/rest/v1/".to_string(),
            api_key: None,
            timeout_secs: 5,
            retry: RetryConfig::default(),
        });
        assert_eq!(
            store.table_url("referral_users"),
            "https://store.example.com/rest/v1/referral_users"
        );
    }

    #[test]
    fn test_eq_filter_format() {
        assert_eq!(eq("user_a"), "eq.user_a");
    }
}
