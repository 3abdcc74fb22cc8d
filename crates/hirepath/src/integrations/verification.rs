use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::config::VerificationConfig;

/// In-memory file handed to the OCR service.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Envelope returned by the driving-licence OCR endpoint. A non-success
/// envelope is data, not an error: the licence simply stays unverified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseCheck {
    pub success: bool,
    pub licence_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub valid_till: Option<NaiveDate>,
}

/// Envelope returned by the identity OCR endpoint (Aadhaar + PAN pair).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityCheck {
    pub success: bool,
    pub aadhaar_name: Option<String>,
    pub pan_dob: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("verification request failed: {0}")]
    Transport(String),
    #[error("verification response malformed: {0}")]
    Envelope(String),
}

/// Outbound contract with the external OCR verification service.
///
/// Both operations are fire-once: no retry, no timeout configuration, no
/// idempotency key. A duplicate submit re-posts the same files.
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    async fn verify_license(&self, licence: DocumentPayload)
        -> Result<LicenseCheck, VerificationError>;

    async fn verify_identity(
        &self,
        aadhaar: DocumentPayload,
        pan: DocumentPayload,
    ) -> Result<IdentityCheck, VerificationError>;
}

/// Gateway posting multipart payloads to the fixed OCR endpoints.
pub struct RestVerificationGateway {
    client: reqwest::Client,
    identity_endpoint: String,
    license_endpoint: String,
}

impl RestVerificationGateway {
    pub fn new(config: &VerificationConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            identity_endpoint: config.identity_endpoint.clone(),
            license_endpoint: config.license_endpoint.clone(),
        }
    }
}

fn file_part(payload: DocumentPayload) -> Part {
    Part::bytes(payload.bytes).file_name(payload.file_name)
}

#[async_trait]
impl VerificationGateway for RestVerificationGateway {
    async fn verify_license(
        &self,
        licence: DocumentPayload,
    ) -> Result<LicenseCheck, VerificationError> {
        let form = Form::new().part("licence_file", file_part(licence));
        let response = self
            .client
            .post(&self.license_endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| VerificationError::Transport(err.to_string()))?;

        let accepted = response.status().is_success();
        let mut check: LicenseCheck = response
            .json()
            .await
            .map_err(|err| VerificationError::Envelope(err.to_string()))?;
        if !accepted {
            check.success = false;
        }

        Ok(check)
    }

    async fn verify_identity(
        &self,
        aadhaar: DocumentPayload,
        pan: DocumentPayload,
    ) -> Result<IdentityCheck, VerificationError> {
        let form = Form::new()
            .part("aadhaar_file", file_part(aadhaar))
            .part("pan_file", file_part(pan));
        let response = self
            .client
            .post(&self.identity_endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| VerificationError::Transport(err.to_string()))?;

        // The endpoint reports extraction failure as a 400 with an error body;
        // the missing success flag already marks the check unverified.
        response
            .json()
            .await
            .map_err(|err| VerificationError::Envelope(err.to_string()))
    }
}
