//! Dashboard endpoints

use axum::{extract::State, Extension, Json};
use referral_core::Principal;

use crate::dto::{AnalyticsResponse, LeaderboardResponse, LeaderboardRow};
use crate::state::AppState;

/// Conversion and revenue analytics for the signed-in referrer.
pub async fn analytics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<AnalyticsResponse> {
    let analytics = state.analytics.compute(principal.uid.as_str()).await;
    Json(analytics.into())
}

/// The top referrers.
pub async fn leaderboard(State(state): State<AppState>) -> Json<LeaderboardResponse> {
    let limit = state.engine.config().leaderboard_limit;
    let entries = state.leaderboard.top_referrers(limit).await;
    Json(LeaderboardResponse {
        entries: entries.iter().map(LeaderboardRow::from).collect(),
    })
}
