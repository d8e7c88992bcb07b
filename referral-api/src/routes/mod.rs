//! API routes

pub mod capture;
pub mod dashboard;
pub mod discount;
pub mod health;
pub mod purchase;
pub mod referral;
pub mod session;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::principal_middleware;
use crate::state::AppState;

/// Create the API router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // health
        .route("/", get(health::root))
        .route("/health", get(health::health))
        // referral capture and sign-in
        .route("/api/v1/referrals/capture", post(capture::capture))
        .route("/api/v1/session/sign-in", post(session::sign_in))
        // current user
        .route("/api/v1/me", get(referral::me))
        .route("/api/v1/me/referral-link", get(referral::referral_link))
        .route("/api/v1/me/activities", get(referral::activities))
        .route("/api/v1/me/discounts", get(discount::list_discounts))
        .route("/api/v1/me/analytics", get(dashboard::analytics))
        // discounts and purchases
        .route("/api/v1/discounts/{id}/redeem", post(discount::redeem))
        .route("/api/v1/price-quote", post(discount::price_quote))
        .route("/api/v1/purchases", post(purchase::track))
        // leaderboard
        .route("/api/v1/leaderboard", get(dashboard::leaderboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            principal_middleware,
        ))
        .with_state(state)
}
