//! Referral Core - Domain Logic
//!
//! Pure domain logic for the referral and rewards program: tier ladder,
//! discount selection, referral code policy, and read-side aggregation.
//!
//! Nothing in this crate performs I/O. Every function is deterministic
//! given its inputs (code generation takes the clock as an argument and
//! draws salt from the caller's RNG), so results are identical at every
//! call site - the price quote shown on the catalog, the product page,
//! and the checkout all come from the same computation.
//!
//! # Modules
//!
//! - [`types`] - identifier newtypes, the authenticated principal, and
//!   activity status
//! - [`error`] - the referral error registry
//! - [`tier`] - referral-count tier ladder
//! - [`discount`] - best-discount selection and currency rounding
//! - [`code`] - referral code generation and link capture
//! - [`analytics`] - referrer analytics and leaderboard ranking

pub mod analytics;
pub mod code;
pub mod discount;
pub mod error;
pub mod tier;
pub mod types;

pub use analytics::{
    compute_analytics, rank_referrers, ActivitySnapshot, LeaderboardEntry, PurchaseSnapshot,
    ReferralAnalytics,
};
pub use code::{extract_code, generate_code, is_valid_code, referral_link, CapturedCode};
pub use discount::{apply_best_discount, validate_percentage, DiscountView, PriceQuote};
pub use error::{ReferralError, ReferralResult};
pub use tier::Tier;
pub use types::{ActivityStatus, Email, Principal, ReferralCode, UserId};
