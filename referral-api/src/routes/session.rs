//! Sign-in initialization endpoint

use axum::{extract::State, http::HeaderMap, Extension, Json};
use referral_core::Principal;

use crate::auth::session_id_from_headers;
use crate::dto::SignInResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Initialize referral state for a freshly signed-in principal.
///
/// Loads or creates the user row and processes any referral code the
/// capture endpoint staged for this session. A rejected code does not
/// fail the sign-in; the rejection rides along in the response body.
pub async fn sign_in(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
) -> ApiResult<Json<SignInResponse>> {
    // clients that never captured a code have no session header; key
    // the (empty) session off the principal so the lookup still works
    let session_id = session_id_from_headers(&headers)
        .unwrap_or_else(|| format!("user:{}", principal.uid.as_str()));

    let outcome = state
        .engine
        .initialize_on_sign_in(&principal, &session_id)
        .await?;

    Ok(Json(SignInResponse {
        user: (&outcome.user).into(),
        referral: (&outcome.referral).into(),
    }))
}
