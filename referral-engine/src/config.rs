//! Engine Configuration
//!
//! The observed program policy, as knobs. Defaults mirror production;
//! tests shrink the durations to keep runs fast.

use rust_decimal::Decimal;
use std::time::Duration;

/// Referral program policy.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL referral links are built on
    pub base_url: String,
    /// Reward accrued by the referrer per completed referral
    pub reward_per_referral: Decimal,
    /// Percentage off for each minted discount
    pub discount_percentage: u8,
    /// Discount lifetime in days
    pub discount_validity_days: i64,
    /// Maximum attempts for the referrer-stat update
    pub stat_update_attempts: u32,
    /// Linear backoff base between stat-update attempts
    pub stat_retry_base_delay: Duration,
    /// Delay before dependent reads after a referral write lands
    pub settle_delay: Duration,
    /// Dashboard polling cadence
    pub refresh_interval: Duration,
    /// Maximum regenerations when a referral code collides
    pub code_collision_attempts: u32,
    /// Leaderboard size
    pub leaderboard_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            reward_per_referral: Decimal::new(25, 0),
            discount_percentage: 15,
            discount_validity_days: 30,
            stat_update_attempts: 3,
            stat_retry_base_delay: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            refresh_interval: Duration::from_secs(30),
            code_collision_attempts: 5,
            leaderboard_limit: 10,
        }
    }
}

impl EngineConfig {
    /// Read overridable settings from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("REFERRAL_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_program_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.reward_per_referral, Decimal::new(25, 0));
        assert_eq!(config.discount_percentage, 15);
        assert_eq!(config.discount_validity_days, 30);
        assert_eq!(config.stat_update_attempts, 3);
        assert_eq!(config.leaderboard_limit, 10);
    }
}
