//! Referral API - HTTP Surface
//!
//! Exposes the referral program over HTTP for the storefront client:
//! entry-point capture, sign-in initialization, referral links,
//! discount listing and redemption, discount-aware price quotes,
//! purchase tracking, analytics, and the leaderboard.
//!
//! Authentication is a collaborator, not a concern of this service: an
//! auth proxy in front of the API resolves the session and forwards the
//! principal in `x-auth-*` headers, which the [`auth`] middleware turns
//! into a typed [`referral_core::Principal`].

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::AuthConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::{create_server, run_server, start_background_server};
pub use state::{ApiConfig, AppState};
