//! Integration specifications for the job-application intake workflow.
//!
//! Scenarios drive the public login flow, wizard and intake service together
//! so the end-to-end submission contract is validated without reaching into
//! private modules.

mod common {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use hirepath::auth::{AuthError, IdentityProvider, Session};
    use hirepath::integrations::storage::{DocumentStore, StorageError};
    use hirepath::integrations::verification::{
        DocumentPayload, IdentityCheck, LicenseCheck, VerificationError, VerificationGateway,
    };
    use hirepath::workflows::intake::{
        ApplicationId, ApplicationStore, EducationRecord, EmploymentRecord, MaritalStatus,
        NewApplication, NewEducationRow, NewEmploymentRow, PersonalInfo, StoreError,
    };

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) fn today() -> NaiveDate {
        date(2025, 6, 15)
    }

    pub(super) fn verified_personal_info() -> PersonalInfo {
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
    struct Tables {
        sequence: u64,
        applications: Vec<(ApplicationId, NewApplication)>,
        education: Vec<NewEducationRow>,
        employment: Vec<NewEmploymentRow>,
    }

    #[derive(Default)]
    pub(super) struct MemoryStore {
        inner: Mutex<Tables>,
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
            let mut inner = self.inner.lock().expect("store mutex");
            inner.sequence += 1;
            let id = ApplicationId(format!("app-{:06}", inner.sequence));
            inner.applications.push((id.clone(), row));
            Ok(id)
        }

        async fn insert_education(&self, rows: Vec<NewEducationRow>) -> Result<(), StoreError> {
            self.inner.lock().expect("store mutex").education.extend(rows);
            Ok(())
        }

        async fn insert_employment(
            &self,
            rows: Vec<NewEmploymentRow>,
        ) -> Result<(), StoreError> {
            self.inner
                .lock()
                .expect("store mutex")
                .employment
                .extend(rows);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryDocuments;

    #[async_trait]
    impl DocumentStore for MemoryDocuments {
        async fn store(
            &self,
            _key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("memory://hr-documents/{key}")
        }
    }

    #[derive(Default)]
    pub(super) struct AlwaysVerified;

    #[async_trait]
    impl VerificationGateway for AlwaysVerified {
        async fn verify_license(
            &self,
            _licence: DocumentPayload,
        ) -> Result<LicenseCheck, VerificationError> {
            Ok(LicenseCheck {
                success: true,
                licence_number: Some("KA0120201234567".to_string()),
                issue_date: Some(date(2020, 3, 15)),
                valid_till: Some(date(2040, 3, 14)),
            })
        }

        async fn verify_identity(
            &self,
            _aadhaar: DocumentPayload,
            _pan: DocumentPayload,
        ) -> Result<IdentityCheck, VerificationError> {
            Ok(IdentityCheck {
                success: true,
                aadhaar_name: Some("Asha Verma".to_string()),
                pan_dob: Some(date(1997, 6, 15)),
            })
        }
    }

    pub(super) struct OneTimeCodeProvider;

    #[async_trait]
    impl IdentityProvider for OneTimeCodeProvider {
        async fn send_code(&self, _email: &str) -> Result<(), AuthError> {
            Ok(())
        }

        async fn verify_code(&self, email: &str, code: &str) -> Result<Session, AuthError> {
            if code == "424242" {
                Ok(Session {
                    access_token: "tok-1".to_string(),
                    user_id: "user-1".to_string(),
                    email: email.to_string(),
                })
            } else {
                Err(AuthError::CodeRejected("invalid code".to_string()))
            }
        }
    }

    pub(super) fn intake_service(
        store: Arc<MemoryStore>,
    ) -> hirepath::workflows::intake::IntakeService<MemoryStore, MemoryDocuments, AlwaysVerified>
    {
        hirepath::workflows::intake::IntakeService::new(
            store,
            Arc::new(MemoryDocuments),
            Arc::new(AlwaysVerified),
        )
    }
}

use std::sync::Arc;

use common::*;
use hirepath::auth::{LoginFlow, LoginState};
use hirepath::workflows::intake::{ApplicationWizard, StepSlice};

#[tokio::test]
async fn login_then_full_wizard_walkthrough_persists_one_application() {
    let mut flow = LoginFlow::new(Arc::new(OneTimeCodeProvider));
    flow.submit_email("supervisor@example.com")
        .await
        .expect("code sent");
    let session = flow.submit_code("424242").await.expect("code accepted");
    assert!(matches!(flow.state(), LoginState::Authenticated(_)));

    let mut wizard = ApplicationWizard::new();
    wizard
        .complete_step(StepSlice::PersonalInfo(verified_personal_info()), today())
        .expect("personal info accepted");
    wizard
        .complete_step(StepSlice::Education(vec![education_record()]), today())
        .expect("education accepted");
    wizard
        .complete_step(
            StepSlice::DrivingLicense(hirepath::workflows::intake::DrivingLicense::default()),
            today(),
        )
        .expect("no licence accepted");
    wizard
        .complete_step(
            StepSlice::EmploymentHistory(vec![
                employment_record("Acme Logistics"),
                employment_record("Bharat Transport Co"),
            ]),
            today(),
        )
        .expect("employment accepted");
    assert_eq!(wizard.current_step(), 5);

    let store = Arc::new(MemoryStore::default());
    let service = intake_service(store.clone());
    let receipt = service
        .submit(wizard.draft(), &session.user_id)
        .await
        .expect("submission succeeds");
    wizard.mark_submitted(receipt.application_id.clone());

    let applications = store.applications();
    assert_eq!(applications.len(), 1);
    let (application_id, row) = &applications[0];
    assert_eq!(*application_id, receipt.application_id);
    assert_eq!(row.user_id, "user-1");
    assert_eq!(row.age, Some(28));
    assert!(!row.has_driving_license);

    let education = store.education_rows();
    assert_eq!(education.len(), 1);
    assert_eq!(education[0].application_id, receipt.application_id);
    assert!((education[0].percentage - 90.0).abs() < f64::EPSILON);

    let employment = store.employment_rows();
    assert_eq!(employment.len(), 2);
    assert!(employment
        .iter()
        .all(|row| row.application_id == receipt.application_id));

    assert!(wizard.is_submitted());
    assert!(matches!(
        wizard.skip_forward(),
        Err(hirepath::workflows::intake::WizardError::AlreadySubmitted)
    ));
}

#[tokio::test]
async fn education_step_blocks_an_empty_history_before_summary() {
    let mut wizard = ApplicationWizard::new();
    wizard
        .complete_step(StepSlice::PersonalInfo(verified_personal_info()), today())
        .expect("personal info accepted");

    let err = wizard
        .complete_step(StepSlice::Education(vec![]), today())
        .expect_err("empty education rejected");
    assert!(matches!(
        err,
        hirepath::workflows::intake::WizardError::Validation(
            hirepath::workflows::intake::ValidationError::MissingEducation
        )
    ));
    assert_eq!(wizard.current_step(), 2);
}
