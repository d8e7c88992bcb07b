//! Health endpoints

use axum::{extract::State, Json};
use serde_json::json;

use crate::state::AppState;

/// Service banner
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "referral-api",
        "version": state.config.version,
    }))
}

/// Liveness check
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": state.config.version,
    }))
}
