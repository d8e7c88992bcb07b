//! Dashboard Refresh Loop
//!
//! Referral writes are not read-your-writes consistent at the store, so
//! the dashboard does not trust state returned inline with a mutation.
//! Instead a polling task re-pulls the signed-in user's stats and
//! discounts: once after a short settle delay, then on a fixed cadence
//! while the view stays open. Stopping the poller is the only cleanup -
//! there is nothing to roll back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use referral_store::{DiscountRepository, ReferralDiscountEntity, ReferralUserEntity,
    UserRepository};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// The dashboard's view of the signed-in user.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub user: Option<ReferralUserEntity>,
    pub discounts: Vec<ReferralDiscountEntity>,
    /// When the last successful pull happened
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Background poller for one user's dashboard.
pub struct DashboardRefresher {
    snapshot: Arc<RwLock<DashboardSnapshot>>,
    handle: tokio::task::JoinHandle<()>,
}

impl DashboardRefresher {
    /// Start polling for a user.
    ///
    /// The first pull waits out the settle delay so reads issued right
    /// after a referral see the store's caught-up state.
    pub fn spawn(
        users: Arc<dyn UserRepository>,
        discounts: Arc<dyn DiscountRepository>,
        uid: String,
        config: &EngineConfig,
    ) -> Self {
        let snapshot = Arc::new(RwLock::new(DashboardSnapshot::default()));
        let shared = snapshot.clone();
        let settle_delay = config.settle_delay;
        let refresh_interval = config.refresh_interval;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            loop {
                let user = match users.get_by_uid(&uid).await {
                    Ok(user) => user,
                    Err(err) => {
                        warn!(%uid, %err, "dashboard user pull failed");
                        None
                    }
                };
                let discount_rows = match discounts.list_for_user(&uid).await {
                    Ok(rows) => rows,
                    Err(err) => {
                        warn!(%uid, %err, "dashboard discount pull failed");
                        Vec::new()
                    }
                };

                debug!(%uid, discounts = discount_rows.len(), "dashboard refreshed");
                {
                    let mut current = shared.write().await;
                    *current = DashboardSnapshot {
                        user,
                        discounts: discount_rows,
                        refreshed_at: Some(Utc::now()),
                    };
                }

                tokio::time::sleep(refresh_interval).await;
            }
        });

        Self { snapshot, handle }
    }

    /// The latest pulled state.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Cancel the polling loop.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for DashboardRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_core::{Principal, ReferralCode};
    use referral_store::{MemoryStore, ReferralUserEntity};
    use std::time::Duration;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            settle_delay: Duration::from_millis(5),
            refresh_interval: Duration::from_millis(10),
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_refresher_pulls_after_settle_delay() {
        let store = Arc::new(MemoryStore::new());
        store
            .create(ReferralUserEntity::new(
                &Principal::new("user_a", "a@example.com"),
                &ReferralCode::new("AAAA1111"),
            ))
            .await
            .unwrap();

        let refresher = DashboardRefresher::spawn(
            store.clone(),
            store.clone(),
            "user_a".to_string(),
            &fast_config(),
        );

        // nothing before the settle delay elapses
        assert!(refresher.snapshot().await.refreshed_at.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = refresher.snapshot().await;
        assert!(snapshot.refreshed_at.is_some());
        assert_eq!(snapshot.user.unwrap().uid, "user_a");

        refresher.stop();
    }

    #[tokio::test]
    async fn test_stop_cancels_polling() {
        let store = Arc::new(MemoryStore::new());
        let refresher = DashboardRefresher::spawn(
            store.clone(),
            store,
            "user_a".to_string(),
            &fast_config(),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        refresher.stop();
        let stopped_at = refresher.snapshot().await.refreshed_at;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(refresher.snapshot().await.refreshed_at, stopped_at);
    }
}
