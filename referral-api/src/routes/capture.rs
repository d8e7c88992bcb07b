//! Entry-point capture endpoint

use axum::{extract::State, http::HeaderMap, Json};
use referral_engine::CaptureOutcome;

use crate::auth::session_id_from_headers;
use crate::dto::{CaptureRequest, CaptureResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Capture a referral code from the URL a visitor landed on.
///
/// Runs before authentication, so the code is staged against the
/// client's opaque session id and processed at sign-in.
pub async fn capture(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<Json<CaptureResponse>> {
    let session_id = session_id_from_headers(&headers)
        .ok_or_else(|| ApiError::validation("x-session-id header is required"))?;

    let outcome = state
        .capture
        .capture_from_entry_point(&session_id, &request.url)
        .await;

    let response = match outcome {
        CaptureOutcome::NoCode => CaptureResponse {
            status: "no_code".to_string(),
            code: None,
            sanitized_url: None,
            rejection: None,
        },
        CaptureOutcome::Staged {
            code,
            sanitized_url,
        } => CaptureResponse {
            status: "staged".to_string(),
            code: Some(code.as_str().to_string()),
            sanitized_url: Some(sanitized_url),
            rejection: None,
        },
        CaptureOutcome::Rejected(err) => CaptureResponse {
            status: "rejected".to_string(),
            code: None,
            sanitized_url: None,
            rejection: Some((&err).into()),
        },
    };
    Ok(Json(response))
}
