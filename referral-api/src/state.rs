//! Application state for the API server

use std::sync::Arc;

use referral_engine::{
    AnalyticsService, CaptureService, EngineConfig, LeaderboardService, MemorySessionStore,
    ReferralEngine, SessionStore,
};
use referral_store::{
    ActivityRepository, DiscountRepository, MemoryStore, PurchaseRepository, UserRepository,
};

use crate::auth::AuthConfig;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ApiConfig {
    /// Create from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("REFERRAL_API_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("REFERRAL_API_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        config
    }
}

/// API server state, shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub auth: Arc<AuthConfig>,
    pub engine: Arc<ReferralEngine>,
    pub capture: Arc<CaptureService>,
    pub analytics: Arc<AnalyticsService>,
    pub leaderboard: Arc<LeaderboardService>,
    pub users: Arc<dyn UserRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub discounts: Arc<dyn DiscountRepository>,
}

impl AppState {
    /// Wire the services over a concrete set of repositories.
    pub fn build(
        config: ApiConfig,
        engine_config: EngineConfig,
        users: Arc<dyn UserRepository>,
        activities: Arc<dyn ActivityRepository>,
        discounts: Arc<dyn DiscountRepository>,
        purchases: Arc<dyn PurchaseRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let engine = Arc::new(ReferralEngine::new(
            users.clone(),
            activities.clone(),
            discounts.clone(),
            purchases.clone(),
            sessions.clone(),
            engine_config,
        ));
        let capture = Arc::new(CaptureService::new(users.clone(), sessions));
        let analytics = Arc::new(AnalyticsService::new(activities.clone(), purchases));
        let leaderboard = Arc::new(LeaderboardService::new(users.clone()));

        Self {
            config,
            auth: Arc::new(AuthConfig::from_env()),
            engine,
            capture,
            analytics,
            leaderboard,
            users,
            activities,
            discounts,
        }
    }

    /// State backed entirely by the in-memory store, for tests and
    /// local development.
    pub fn with_memory_store(config: ApiConfig, engine_config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(
            config,
            engine_config,
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(MemorySessionStore::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.enable_cors);
    }
}
