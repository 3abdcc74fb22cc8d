use std::sync::Arc;

use super::provider::{AuthError, IdentityProvider, Session};

/// States of the passwordless login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginState {
    EnteringEmail,
    CodeSent { email: String },
    Authenticated(Session),
}

/// Linear one-time-passcode flow: collect an email, exchange the emailed code
/// for a session. Failed attempts keep the current state so the caller can
/// retry without limit; there is no lockout.
pub struct LoginFlow<P> {
    provider: Arc<P>,
    state: LoginState,
}

impl<P> LoginFlow<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            state: LoginState::EnteringEmail,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            LoginState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Request a one-time code. Also usable from `CodeSent` to re-send a code
    /// to a corrected address.
    pub async fn submit_email(&mut self, email: &str) -> Result<(), AuthError> {
        if let LoginState::Authenticated(_) = self.state {
            return Ok(());
        }

        self.provider.send_code(email).await?;
        self.state = LoginState::CodeSent {
            email: email.to_string(),
        };
        Ok(())
    }

    /// Exchange the emailed code for a session. On rejection the flow stays in
    /// `CodeSent` and the same code entry can be retried.
    pub async fn submit_code(&mut self, code: &str) -> Result<Session, AuthError> {
        let email = match &self.state {
            LoginState::CodeSent { email } => email.clone(),
            LoginState::Authenticated(session) => return Ok(session.clone()),
            LoginState::EnteringEmail => return Err(AuthError::CodeNotRequested),
        };

        let session = self.provider.verify_code(&email, code).await?;
        self.state = LoginState::Authenticated(session.clone());
        Ok(session)
    }
}
