use async_trait::async_trait;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use hirepath::auth::{AuthError, IdentityProvider, Session};
use hirepath::integrations::storage::{DocumentStore, StorageError};
use hirepath::integrations::verification::{
    DocumentPayload, IdentityCheck, LicenseCheck, VerificationError, VerificationGateway,
};
use hirepath::workflows::intake::{
    ApplicationId, ApplicationStore, NewApplication, NewEducationRow, NewEmploymentRow,
    StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Tables {
    sequence: u64,
    applications: Vec<(ApplicationId, NewApplication)>,
    education: Vec<NewEducationRow>,
    employment: Vec<NewEmploymentRow>,
}

/// Relational store held entirely in memory for demos and route tests.
#[derive(Default)]
pub(crate) struct InMemoryApplicationStore {
    inner: Mutex<Tables>,
}

impl InMemoryApplicationStore {
    pub(crate) fn applications(&self) -> Vec<(ApplicationId, NewApplication)> {
        self.inner.lock().expect("store mutex poisoned").applications.clone()
    }

    pub(crate) fn education_rows(&self) -> Vec<NewEducationRow> {
        self.inner.lock().expect("store mutex poisoned").education.clone()
    }

    pub(crate) fn employment_rows(&self) -> Vec<NewEmploymentRow> {
        self.inner.lock().expect("store mutex poisoned").employment.clone()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert_application(
        &self,
        row: NewApplication,
    ) -> Result<ApplicationId, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.sequence += 1;
        let id = ApplicationId(format!("app-{:06}", inner.sequence));
        inner.applications.push((id.clone(), row));
        Ok(id)
    }

    async fn insert_education(&self, rows: Vec<NewEducationRow>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        for row in &rows {
            if !inner
                .applications
                .iter()
                .any(|(id, _)| *id == row.application_id)
            {
                return Err(StoreError::Rejected {
                    table: "education",
                    message: format!("unknown application {}", row.application_id.0),
                });
            }
        }
        inner.education.extend(rows);
        Ok(())
    }

    async fn insert_employment(&self, rows: Vec<NewEmploymentRow>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        for row in &rows {
            if !inner
                .applications
                .iter()
                .any(|(id, _)| *id == row.application_id)
            {
                return Err(StoreError::Rejected {
                    table: "employment_history",
                    message: format!("unknown application {}", row.application_id.0),
                });
            }
        }
        inner.employment.extend(rows);
        Ok(())
    }
}

/// Document store that only remembers keys, resolving to `memory://` URLs.
#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn store(
        &self,
        key: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.keys.lock().expect("document mutex poisoned").push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://hr-documents/{key}")
    }
}

/// Verification gateway returning fixed envelopes instead of calling OCR.
pub(crate) struct ScriptedVerificationGateway {
    pub(crate) identity: IdentityCheck,
    pub(crate) license: LicenseCheck,
}

impl Default for ScriptedVerificationGateway {
    fn default() -> Self {
        Self {
            identity: IdentityCheck {
                success: true,
                aadhaar_name: Some("Asha Verma".to_string()),
                pan_dob: NaiveDate::from_ymd_opt(1997, 6, 15),
            },
            license: LicenseCheck {
                success: true,
                licence_number: Some("KA0120201234567".to_string()),
                issue_date: NaiveDate::from_ymd_opt(2020, 3, 15),
                valid_till: NaiveDate::from_ymd_opt(2040, 3, 14),
            },
        }
    }
}

#[async_trait]
impl VerificationGateway for ScriptedVerificationGateway {
    async fn verify_license(
        &self,
        _licence: DocumentPayload,
    ) -> Result<LicenseCheck, VerificationError> {
        Ok(self.license.clone())
    }

    async fn verify_identity(
        &self,
        _aadhaar: DocumentPayload,
        _pan: DocumentPayload,
    ) -> Result<IdentityCheck, VerificationError> {
        Ok(self.identity.clone())
    }
}

/// Identity provider accepting one fixed code, for demos and tests.
pub(crate) struct InMemoryIdentityProvider {
    accepted_code: String,
    sequence: AtomicU64,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self {
            accepted_code: "424242".to_string(),
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn send_code(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        if code != self.accepted_code {
            return Err(AuthError::CodeRejected("invalid code".to_string()));
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Session {
            access_token: format!("token-{id:06}"),
            user_id: format!("user-{id:06}"),
            email: email.to_string(),
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
