//! Current-user referral endpoints

use axum::{extract::State, Extension, Json};
use referral_core::Principal;
use tracing::warn;

use crate::dto::{ActivityResponse, ReferralLinkResponse, UserResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// The signed-in user's referral row.
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .users
        .get_by_uid(principal.uid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("ReferralUser", principal.uid.as_str()))?;
    Ok(Json((&user).into()))
}

/// The signed-in user's shareable referral link.
pub async fn referral_link(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<ReferralLinkResponse>> {
    let user = state
        .users
        .get_by_uid(principal.uid.as_str())
        .await?
        .ok_or_else(|| ApiError::not_found("ReferralUser", principal.uid.as_str()))?;

    Ok(Json(ReferralLinkResponse {
        code: user.referral_code.clone(),
        link: state.engine.generate_referral_link(&user),
    }))
}

/// Activities where the signed-in user is the referrer.
///
/// An unreachable store yields an empty list, never an error.
pub async fn activities(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Json<Vec<ActivityResponse>> {
    let rows = match state
        .activities
        .list_for_referrer(principal.uid.as_str())
        .await
    {
        Ok(rows) => rows,
        Err(err) => {
            warn!(uid = %principal.uid, %err, "activity read failed, returning empty");
            Vec::new()
        }
    };
    Json(rows.iter().map(ActivityResponse::from).collect())
}
