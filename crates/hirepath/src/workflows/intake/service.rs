use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::domain::{percentage, ApplicationDraft, ApplicationId, DrivingLicense, PersonalInfo};
use super::repository::{
    ApplicationStore, NewApplication, NewEducationRow, NewEmploymentRow, StoreError,
};
use crate::integrations::storage::{object_key, DocumentStore, StorageError};
use crate::integrations::verification::{
    DocumentPayload, IdentityCheck, LicenseCheck, VerificationError, VerificationGateway,
};

/// Service composing the document store, verification gateway and relational
/// store behind the intake workflow.
pub struct IntakeService<S, D, V> {
    store: Arc<S>,
    documents: Arc<D>,
    verification: Arc<V>,
}

/// Outcome of a successful final submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub education_rows: usize,
    pub employment_rows: usize,
}

/// Error raised by the final submission. A store failure after the
/// application insert leaves a partially-submitted application behind; that
/// is accepted and surfaced rather than rolled back.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("personal information is incomplete")]
    MissingPersonalInfo,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S, D, V> IntakeService<S, D, V>
where
    S: ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    pub fn new(store: Arc<S>, documents: Arc<D>, verification: Arc<V>) -> Self {
        Self {
            store,
            documents,
            verification,
        }
    }

    /// Upload one supporting document under the given logical folder and
    /// return its publicly resolvable URL.
    pub async fn upload_document(
        &self,
        folder: &str,
        file_name: &str,
        bytes: Vec<u8>,
        index: Option<usize>,
    ) -> Result<String, StorageError> {
        let extension = extension_of(file_name);
        let key = object_key(folder, Utc::now().timestamp_millis(), index, extension);
        let content_type = mime_guess::from_path(file_name).first_or_octet_stream();
        self.documents
            .store(&key, bytes, content_type.essence_str())
            .await?;
        Ok(self.documents.public_url(&key))
    }

    pub async fn verify_identity(
        &self,
        aadhaar: DocumentPayload,
        pan: DocumentPayload,
    ) -> Result<IdentityCheck, VerificationError> {
        self.verification.verify_identity(aadhaar, pan).await
    }

    pub async fn verify_license(
        &self,
        licence: DocumentPayload,
    ) -> Result<LicenseCheck, VerificationError> {
        self.verification.verify_license(licence).await
    }

    /// Persist the draft: one application row, then the education batch, then
    /// the employment batch, each referencing the generated application id.
    /// A failure aborts the remaining inserts.
    pub async fn submit(
        &self,
        draft: &ApplicationDraft,
        user_id: &str,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let personal = draft
            .personal_info
            .as_ref()
            .ok_or(SubmissionError::MissingPersonalInfo)?;
        let license = draft.driving_license.clone().unwrap_or_default();

        let application_id = self
            .store
            .insert_application(flatten_application(personal, &license, user_id))
            .await?;

        let education_rows = draft.education.len();
        if education_rows > 0 {
            let rows = draft
                .education
                .iter()
                .map(|record| NewEducationRow {
                    application_id: application_id.clone(),
                    level_of_education: record.level_of_education.clone(),
                    institution_name: record.institution_name.clone(),
                    institution_address: record.institution_address.clone(),
                    completion_year: record.completion_year,
                    completion_month: record.completion_month,
                    marks_obtained: record.marks_obtained,
                    maximum_marks: record.maximum_marks,
                    percentage: percentage(record.marks_obtained, record.maximum_marks),
                    certificate_url: record.certificate_url.clone(),
                })
                .collect();
            self.store.insert_education(rows).await?;
        }

        let employment_rows = draft.employment_history.len();
        if employment_rows > 0 {
            let rows = draft
                .employment_history
                .iter()
                .map(|record| NewEmploymentRow {
                    application_id: application_id.clone(),
                    employer_name: record.employer_name.clone(),
                    designation: record.designation.clone(),
                    address: record.address.clone(),
                    joining_date: record.joining_date,
                    leaving_date: record.leaving_date,
                    take_home_salary: record.take_home_salary,
                    reason_for_leaving: record.reason_for_leaving.clone(),
                    may_contact_employer: record.may_contact_employer,
                    certificate_url: record.certificate_url.clone(),
                })
                .collect();
            self.store.insert_employment(rows).await?;
        }

        Ok(SubmissionReceipt {
            application_id,
            education_rows,
            employment_rows,
        })
    }
}

fn flatten_application(
    personal: &PersonalInfo,
    license: &DrivingLicense,
    user_id: &str,
) -> NewApplication {
    NewApplication {
        user_id: user_id.to_string(),
        full_name: personal.full_name.clone(),
        date_of_birth: personal.date_of_birth,
        age: personal.age,
        phone_number: personal.phone_number.clone(),
        email: personal.email.clone(),
        present_address: personal.present_address.clone(),
        state: personal.state.clone(),
        marital_status: personal.marital_status,
        number_of_children: personal.number_of_children,
        aadhaar_card_url: personal.aadhaar_card_url.clone(),
        pan_card_url: personal.pan_card_url.clone(),
        identity_verified: personal.identity_verified,
        has_driving_license: license.has_driving_license,
        license_number: license.license_number.clone(),
        license_issue_date: license.license_issue_date,
        license_expiry_date: license.license_expiry_date,
        issuing_authority: license.issuing_authority.clone(),
        vehicle_classes: license.vehicle_classes.clone(),
        driving_license_url: license.driving_license_url.clone(),
        license_verified: license.license_verified,
        status: "submitted".to_string(),
        current_step: super::wizard::LAST_STEP,
    }
}

fn extension_of(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
}
