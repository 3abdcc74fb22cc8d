use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::auth::{AuthError, IdentityProvider, Session, SessionRegistry};
use crate::integrations::storage::{DocumentStore, StorageError};
use crate::integrations::verification::{
    DocumentPayload, IdentityCheck, LicenseCheck, VerificationError, VerificationGateway,
};
use crate::workflows::intake::domain::{
    ApplicationId, DrivingLicense, EducationRecord, EmploymentRecord, MaritalStatus, PersonalInfo,
};
use crate::workflows::intake::repository::{
    ApplicationStore, NewApplication, NewEducationRow, NewEmploymentRow, StoreError,
};
use crate::workflows::intake::router::{IntakeRouterState, WizardRegistry};
use crate::workflows::intake::service::IntakeService;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn personal_info() -> PersonalInfo {
    PersonalInfo {
        full_name: "Asha Verma".to_string(),
        date_of_birth: date(1997, 6, 15),
        age: None,
        phone_number: "9876543210".to_string(),
        email: "asha.verma@example.com".to_string(),
        present_address: "12 MG Road, Indiranagar, Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        marital_status: MaritalStatus::Single,
        number_of_children: 0,
        aadhaar_card_url: Some("memory://hr-documents/aadhaar/1.png".to_string()),
        pan_card_url: Some("memory://hr-documents/pan/1.png".to_string()),
        identity_verified: true,
    }
}

pub(super) fn education_record() -> EducationRecord {
    EducationRecord {
        level_of_education: "Graduation".to_string(),
        institution_name: "Bangalore University".to_string(),
        institution_address: "Jnana Bharathi, Bengaluru".to_string(),
        completion_year: 2018,
        completion_month: 6,
        marks_obtained: 450.0,
        maximum_marks: 500.0,
        percentage: 0.0,
        certificate_url: None,
    }
}

pub(super) fn verified_license() -> DrivingLicense {
    DrivingLicense {
        has_driving_license: true,
        license_number: Some("KA0120201234567".to_string()),
        license_issue_date: Some(date(2020, 3, 15)),
        license_expiry_date: Some(date(2040, 3, 14)),
        issuing_authority: Some("RTO Bengaluru".to_string()),
        vehicle_classes: vec!["LMV (Light Motor Vehicle)".to_string()],
        driving_license_url: Some("memory://hr-documents/driving-license/1.png".to_string()),
        license_verified: true,
    }
}

pub(super) fn employment_record(employer: &str) -> EmploymentRecord {
    EmploymentRecord {
        employer_name: employer.to_string(),
        designation: "Field Supervisor".to_string(),
        address: "Industrial Area, Pune".to_string(),
        joining_date: date(2019, 1, 7),
        leaving_date: Some(date(2022, 8, 31)),
        take_home_salary: Some(32_000),
        reason_for_leaving: Some("Relocation".to_string()),
        may_contact_employer: true,
        certificate_url: None,
    }
}

#[derive(Default)]
pub(super) struct MemoryStoreInner {
    sequence: u64,
    pub(super) applications: Vec<(ApplicationId, NewApplication)>,
    pub(super) education: Vec<NewEducationRow>,
    pub(super) employment: Vec<NewEmploymentRow>,
}

/// Relational-store double recording every insert in memory.
#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) inner: Mutex<MemoryStoreInner>,
    pub(super) fail_education: bool,
    pub(super) fail_application: bool,
}

impl MemoryStore {
    pub(super) fn applications(&self) -> Vec<(ApplicationId, NewApplication)> {
        self.inner.lock().expect("store mutex").applications.clone()
    }

    pub(super) fn education_rows(&self) -> Vec<NewEducationRow> {
        self.inner.lock().expect("store mutex").education.clone()
    }

    pub(super) fn employment_rows(&self) -> Vec<NewEmploymentRow> {
        self.inner.lock().expect("store mutex").employment.clone()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(
        &self,
        row: NewApplication,
    ) -> Result<ApplicationId, StoreError> {
        if self.fail_application {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        let mut inner = self.inner.lock().expect("store mutex");
        inner.sequence += 1;
        let id = ApplicationId(format!("app-{:06}", inner.sequence));
        inner.applications.push((id.clone(), row));
        Ok(id)
    }

    async fn insert_education(&self, rows: Vec<NewEducationRow>) -> Result<(), StoreError> {
        if self.fail_education {
            return Err(StoreError::Rejected {
                table: "education",
                message: "constraint violation".to_string(),
            });
        }
        let mut inner = self.inner.lock().expect("store mutex");
        for row in &rows {
            if !inner.applications.iter().any(|(id, _)| *id == row.application_id) {
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
        let mut inner = self.inner.lock().expect("store mutex");
        for row in &rows {
            if !inner.applications.iter().any(|(id, _)| *id == row.application_id) {
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

/// Document-store double keeping uploaded keys in memory.
#[derive(Default)]
pub(super) struct MemoryDocuments {
    pub(super) stored: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl DocumentStore for MemoryDocuments {
    async fn store(
        &self,
        key: &str,
        _bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.stored
            .lock()
            .expect("documents mutex")
            .push((key.to_string(), content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://hr-documents/{key}")
    }
}

/// Verification double returning pre-scripted envelopes.
pub(super) struct ScriptedVerification {
    pub(super) identity: Result<IdentityCheck, String>,
    pub(super) license: Result<LicenseCheck, String>,
}

impl Default for ScriptedVerification {
    fn default() -> Self {
        Self {
            identity: Ok(IdentityCheck {
                success: true,
                aadhaar_name: Some("Asha Verma".to_string()),
                pan_dob: Some(date(1997, 6, 15)),
            }),
            license: Ok(LicenseCheck {
                success: true,
                licence_number: Some("KA0120201234567".to_string()),
                issue_date: Some(date(2020, 3, 15)),
                valid_till: Some(date(2040, 3, 14)),
            }),
        }
    }
}

#[async_trait]
impl VerificationGateway for ScriptedVerification {
    async fn verify_license(
        &self,
        _licence: DocumentPayload,
    ) -> Result<LicenseCheck, VerificationError> {
        self.license
            .clone()
            .map_err(VerificationError::Transport)
    }

    async fn verify_identity(
        &self,
        _aadhaar: DocumentPayload,
        _pan: DocumentPayload,
    ) -> Result<IdentityCheck, VerificationError> {
        self.identity
            .clone()
            .map_err(VerificationError::Transport)
    }
}

/// Identity-provider double accepting a single fixed code.
pub(super) struct MemoryIdentityProvider {
    pub(super) accepted_code: String,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self {
            accepted_code: "424242".to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn send_code(&self, _email: &str) -> Result<(), AuthError> {
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        if code == self.accepted_code {
            Ok(Session {
                access_token: format!("token-{email}"),
                user_id: format!("user-{email}"),
                email: email.to_string(),
            })
        } else {
            Err(AuthError::CodeRejected("invalid code".to_string()))
        }
    }
}

pub(super) type TestState =
    IntakeRouterState<MemoryIdentityProvider, MemoryStore, MemoryDocuments, ScriptedVerification>;

pub(super) fn build_state() -> (Arc<TestState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(IntakeService::new(
        store.clone(),
        Arc::new(MemoryDocuments::default()),
        Arc::new(ScriptedVerification::default()),
    ));
    let state = Arc::new(IntakeRouterState {
        identity: Arc::new(MemoryIdentityProvider::default()),
        service,
        sessions: Arc::new(SessionRegistry::default()),
        wizards: Arc::new(WizardRegistry::default()),
    });
    (state, store)
}

/// Authorize a caller directly against the registries, skipping the OTP
/// round-trip.
pub(super) fn logged_in(state: &TestState) -> (Session, String) {
    let session = Session {
        access_token: "tok-test".to_string(),
        user_id: "user-test".to_string(),
        email: "supervisor@example.com".to_string(),
    };
    state.sessions.store(session.clone());
    let session_id = state.wizards.open(&session.user_id);
    (session, session_id)
}
