use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::provider::{AuthError, IdentityProvider, Session};
use crate::config::BackendConfig;

/// Identity provider speaking the hosted backend's GoTrue-style REST API.
pub struct RestIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestIdentityProvider {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    access_token: String,
    user: VerifiedUser,
}

#[derive(Debug, Deserialize)]
struct VerifiedUser {
    id: String,
    email: Option<String>,
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn send_code(&self, email: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/otp", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "create_user": false }))
            .send()
            .await
            .map_err(|err| AuthError::CodeRequest(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::CodeRequest(format!(
                "identity provider returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/verify", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "token": code, "type": "email" }))
            .send()
            .await
            .map_err(|err| AuthError::CodeRejected(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::CodeRejected(format!(
                "identity provider returned {}",
                response.status()
            )));
        }

        let verified: VerifyResponse = response
            .json()
            .await
            .map_err(|err| AuthError::CodeRejected(err.to_string()))?;

        Ok(Session {
            access_token: verified.access_token,
            user_id: verified.user.id,
            email: verified.user.email.unwrap_or_else(|| email.to_string()),
        })
    }
}
