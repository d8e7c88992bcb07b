//! Discount endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use referral_core::{apply_best_discount, DiscountView, Principal};
use serde_json::json;
use tracing::warn;

use crate::dto::{DiscountResponse, PriceQuoteRequest, PriceQuoteResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// The signed-in user's discounts, redeemed ones included.
pub async fn list_discounts(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<DiscountResponse>> {
    let rows = match state.discounts.list_for_user(principal.uid.as_str()).await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(uid = %principal.uid, %err, "discount read failed, returning empty");
            Vec::new()
        }
    };
    Json(rows.iter().map(DiscountResponse::from).collect())
}

/// Redeem one of the signed-in user's discounts.
///
/// Idempotent from the caller's perspective: a repeat redemption, an
/// unknown id, or someone else's discount all return success with no
/// effect.
pub async fn redeem(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(discount_id): Path<String>,
) -> Json<serde_json::Value> {
    state.engine.redeem(&principal.uid, &discount_id).await;
    Json(json!({ "status": "ok" }))
}

/// Quote a price with the signed-in user's best discount applied.
pub async fn price_quote(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<PriceQuoteRequest>,
) -> ApiResult<Json<PriceQuoteResponse>> {
    let rows = match state.discounts.list_for_user(principal.uid.as_str()).await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(uid = %principal.uid, %err, "discount read failed, quoting without discounts");
            Vec::new()
        }
    };
    let views: Vec<DiscountView> = rows.iter().map(|d| d.to_view()).collect();

    let quote = apply_best_discount(request.price, &views, Utc::now());
    let applied = quote.applied.as_ref().and_then(|view| {
        rows.iter()
            .find(|d| d.id == view.id)
            .map(DiscountResponse::from)
    });

    Ok(Json(PriceQuoteResponse {
        original_price: quote.original_price,
        final_price: quote.final_price,
        applied,
    }))
}
