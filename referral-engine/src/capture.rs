//! Entry-Point Capture
//!
//! Extracts a referral code from the page URL a visitor landed on,
//! validates it against the user store, and stages it in durable
//! session state until the visitor authenticates. The `ref` parameter
//! is stripped from the returned URL so reloads and shares do not
//! re-process the code.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use referral_core::{extract_code, ReferralCode, ReferralError};
use referral_store::UserRepository;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Session-scoped staging for a pending referral code.
///
/// Keyed by an opaque session id owned by the client. Implementations
/// must tolerate repeated stage/clear calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn pending_code(&self, session_id: &str) -> Option<ReferralCode>;

    async fn stage(&self, session_id: &str, code: ReferralCode);

    async fn clear(&self, session_id: &str);
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    pending: RwLock<HashMap<String, ReferralCode>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn pending_code(&self, session_id: &str) -> Option<ReferralCode> {
        self.pending.read().await.get(session_id).cloned()
    }

    async fn stage(&self, session_id: &str, code: ReferralCode) {
        self.pending
            .write()
            .await
            .insert(session_id.to_string(), code);
    }

    async fn clear(&self, session_id: &str) {
        self.pending.write().await.remove(session_id);
    }
}

/// Result of processing an entry-point URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No `ref` parameter present; nothing staged
    NoCode,
    /// Code validated and staged for this session
    Staged {
        code: ReferralCode,
        sanitized_url: String,
    },
    /// Code present but rejected; nothing staged
    Rejected(ReferralError),
}

/// Captures referral codes from entry-point URLs.
pub struct CaptureService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionStore>,
}

impl CaptureService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { users, sessions }
    }

    /// Process the URL a visitor entered on.
    ///
    /// Idempotent: a URL with no code is a no-op, and re-capturing the
    /// same code simply restages it.
    pub async fn capture_from_entry_point(
        &self,
        session_id: &str,
        page_url: &str,
    ) -> CaptureOutcome {
        let captured = match extract_code(page_url) {
            Ok(Some(captured)) => captured,
            Ok(None) => return CaptureOutcome::NoCode,
            Err(err) => {
                debug!(%page_url, %err, "rejected malformed referral parameter");
                return CaptureOutcome::Rejected(err);
            }
        };

        // the code must resolve to a real user before it is staged
        match self.users.get_by_code(captured.code.as_str()).await {
            Ok(Some(_)) => {
                self.sessions.stage(session_id, captured.code.clone()).await;
                CaptureOutcome::Staged {
                    code: captured.code,
                    sanitized_url: captured.sanitized_url,
                }
            }
            Ok(None) => CaptureOutcome::Rejected(ReferralError::InvalidCode {
                code: captured.code.as_str().to_string(),
            }),
            Err(err) => {
                warn!(%err, "store unavailable during code validation");
                CaptureOutcome::Rejected(ReferralError::Storage(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use referral_core::{Principal, ReferralCode as Code};
    use referral_store::{MemoryStore, ReferralUserEntity};

    async fn service_with_user(code: &str) -> (CaptureService, Arc<MemorySessionStore>) {
        let store = Arc::new(MemoryStore::new());
        store
            .create(ReferralUserEntity::new(
                &Principal::new("user_a", "a@example.com"),
                &Code::new(code),
            ))
            .await
            .unwrap();
        let sessions = Arc::new(MemorySessionStore::new());
        (
            CaptureService::new(store, sessions.clone()),
            sessions,
        )
    }

    #[tokio::test]
    async fn test_valid_code_is_staged_and_url_sanitized() {
        let (service, sessions) = service_with_user("ABC12345").await;

        let outcome = service
            .capture_from_entry_point("session-1", "https://shop.example.com/?ref=ABC12345")
            .await;

        match outcome {
            CaptureOutcome::Staged {
                code,
                sanitized_url,
            } => {
                assert_eq!(code.as_str(), "ABC12345");
                assert_eq!(sanitized_url, "https://shop.example.com/");
            }
            other => panic!("expected staged, got {:?}", other),
        }
        assert_eq!(
            sessions.pending_code("session-1").await,
            Some(Code::new("ABC12345"))
        );
    }

    #[tokio::test]
    async fn test_unknown_code_is_rejected_without_staging() {
        let (service, sessions) = service_with_user("ABC12345").await;

        let outcome = service
            .capture_from_entry_point("session-1", "https://shop.example.com/?ref=ZZZ99999")
            .await;

        assert!(matches!(
            outcome,
            CaptureOutcome::Rejected(ReferralError::InvalidCode { .. })
        ));
        assert!(sessions.pending_code("session-1").await.is_none());
    }

    #[tokio::test]
    async fn test_no_code_is_a_noop() {
        let (service, sessions) = service_with_user("ABC12345").await;

        let outcome = service
            .capture_from_entry_point("session-1", "https://shop.example.com/products")
            .await;

        assert_eq!(outcome, CaptureOutcome::NoCode);
        assert!(sessions.pending_code("session-1").await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let (service, sessions) = service_with_user("ABC12345").await;

        service
            .capture_from_entry_point("session-1", "https://shop.example.com/?ref=ABC12345")
            .await;

        assert!(sessions.pending_code("session-2").await.is_none());
    }
}
