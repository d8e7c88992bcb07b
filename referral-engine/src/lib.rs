//! Referral Engine - Orchestration Layer
//!
//! Coordinates the referral lifecycle over the storage layer: code
//! capture from entry-point URLs, referral completion on sign-in,
//! discount minting and redemption, purchase tracking, and the
//! read-side services (analytics, leaderboard, dashboard refresh).
//!
//! The engine is a stateless service over injected repositories - no
//! ambient singletons. All session-scoped state (the staged pending
//! code) lives behind the [`SessionStore`] trait.
//!
//! # Modules
//!
//! - [`engine`] - referral completion, sign-in initialization,
//!   redemption, purchase tracking
//! - [`capture`] - entry-point code capture and session staging
//! - [`analytics`] - per-referrer conversion/revenue aggregation
//! - [`leaderboard`] - top-referrer ranking
//! - [`refresh`] - dashboard polling loop
//! - [`config`] - engine policy knobs

pub mod analytics;
pub mod capture;
pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod refresh;

pub use analytics::AnalyticsService;
pub use capture::{CaptureOutcome, CaptureService, MemorySessionStore, SessionStore};
pub use config::EngineConfig;
pub use engine::{
    CompletedReferral, ReferralEngine, SignInOutcome, SignInReferral, TrackPurchase,
};
pub use leaderboard::LeaderboardService;
pub use refresh::{DashboardRefresher, DashboardSnapshot};
