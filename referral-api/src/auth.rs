//! Authentication Boundary
//!
//! The platform's auth proxy terminates the session and forwards the
//! signed-in principal in headers:
//!
//! ```text
//! x-auth-uid:   stable unique id (required)
//! x-auth-email: email address (required)
//! x-auth-name:  display name (optional)
//! ```
//!
//! This service never authenticates anyone itself; the middleware only
//! turns the forwarded headers into a typed [`Principal`] and rejects
//! protected requests that arrive without one. The client's opaque
//! session id travels separately in `x-session-id` and scopes the
//! staged pending referral code.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use referral_core::Principal;

use crate::error::ErrorResponse;
use crate::state::AppState;

/// Header carrying the principal's unique id
pub const HEADER_UID: &str = "x-auth-uid";
/// Header carrying the principal's email
pub const HEADER_EMAIL: &str = "x-auth-email";
/// Header carrying the optional display name
pub const HEADER_NAME: &str = "x-auth-name";
/// Header carrying the client's opaque session id
pub const HEADER_SESSION: &str = "x-session-id";

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Paths served without a principal
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/".to_string(),
                "/health".to_string(),
                "/api/v1/referrals/capture".to_string(),
                "/api/v1/leaderboard".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Create from environment variables.
    ///
    /// `REFERRAL_PUBLIC_PATHS` appends extra comma-separated paths.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(extra) = std::env::var("REFERRAL_PUBLIC_PATHS") {
            config
                .public_paths
                .extend(extra.split(',').map(|p| p.trim().to_string()));
        }
        config
    }

    /// Check if a path is public (doesn't require a principal)
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths
            .iter()
            .any(|p| path == p || path.starts_with(&format!("{}/", p)))
    }
}

/// Extract the principal from forwarded auth headers.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let uid = headers.get(HEADER_UID)?.to_str().ok()?.trim();
    let email = headers.get(HEADER_EMAIL)?.to_str().ok()?.trim();
    if uid.is_empty() || email.is_empty() {
        return None;
    }

    let mut principal = Principal::new(uid, email);
    if let Some(name) = headers
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        principal = principal.with_display_name(name);
    }
    Some(principal)
}

/// Extract the client session id, if forwarded.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HEADER_SESSION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Middleware requiring a principal on non-public paths.
pub async fn principal_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.auth.is_public_path(&path) {
        return next.run(request).await;
    }

    match principal_from_headers(request.headers()) {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => {
            let body = ErrorResponse {
                code: "UNAUTHORIZED".to_string(),
                message: "missing or incomplete auth headers".to_string(),
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_public_path_matching() {
        let config = AuthConfig::default();
        assert!(config.is_public_path("/health"));
        assert!(config.is_public_path("/api/v1/referrals/capture"));
        assert!(!config.is_public_path("/api/v1/me"));
    }

    #[test]
    fn test_principal_requires_uid_and_email() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_UID, HeaderValue::from_static("user_a"));
        assert!(principal_from_headers(&headers).is_none());

        headers.insert(HEADER_EMAIL, HeaderValue::from_static("a@example.com"));
        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.uid.as_str(), "user_a");
        assert_eq!(principal.email.as_str(), "a@example.com");
        assert!(principal.display_name.is_none());
    }

    #[test]
    fn test_display_name_is_optional() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_UID, HeaderValue::from_static("user_a"));
        headers.insert(HEADER_EMAIL, HeaderValue::from_static("a@example.com"));
        headers.insert(HEADER_NAME, HeaderValue::from_static("Ada"));
        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_session_id_extraction() {
        let mut headers = HeaderMap::new();
        assert!(session_id_from_headers(&headers).is_none());
        headers.insert(HEADER_SESSION, HeaderValue::from_static("sess-1"));
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("sess-1"));
    }
}
