use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Session handed out after a successful one-time-passcode exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    pub email: String,
}

/// Error raised by the login flow and the credential gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("could not send one-time code: {0}")]
    CodeRequest(String),
    #[error("one-time code rejected: {0}")]
    CodeRejected(String),
    #[error("request a one-time code before submitting one")]
    CodeNotRequested,
    #[error("no active session")]
    SessionMissing,
}

/// Outbound contract with the hosted identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Request a one-time code for `email` without implicitly creating an account.
    async fn send_code(&self, email: &str) -> Result<(), AuthError>;

    /// Exchange the emailed code for a session (channel is always "email").
    async fn verify_code(&self, email: &str, code: &str) -> Result<Session, AuthError>;
}

/// Registry of issued sessions backing the credential gate.
///
/// Re-evaluated per request; there is no expiry or refresh handling here.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn store(&self, session: Session) {
        let mut guard = self.sessions.lock().expect("session registry mutex poisoned");
        guard.insert(session.access_token.clone(), session);
    }

    pub fn authorize(&self, access_token: &str) -> Result<Session, AuthError> {
        let guard = self.sessions.lock().expect("session registry mutex poisoned");
        guard
            .get(access_token)
            .cloned()
            .ok_or(AuthError::SessionMissing)
    }
}
