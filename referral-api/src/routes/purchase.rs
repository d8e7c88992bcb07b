//! Purchase tracking endpoint

use axum::{extract::State, Extension, Json};
use referral_core::Principal;
use referral_engine::TrackPurchase;
use rust_decimal::Decimal;

use crate::dto::{PurchaseRequest, PurchaseResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Record a completed purchase for the signed-in user.
///
/// Redeems the applied discount (if any) and rolls the purchase into
/// the referral activity and referrer stats.
pub async fn track(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<PurchaseRequest>,
) -> ApiResult<Json<PurchaseResponse>> {
    let purchase = state
        .engine
        .track_purchase(
            &principal,
            TrackPurchase {
                product_id: request.product_id,
                product_name: request.product_name,
                amount: request.amount,
                discount_id: request.discount_id,
                discount_amount: request.discount_amount.unwrap_or(Decimal::ZERO),
            },
        )
        .await?;

    Ok(Json((&purchase).into()))
}
