use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    age_on, percentage, ApplicationDraft, ApplicationId, DrivingLicense, EducationRecord,
    EmploymentRecord, PersonalInfo,
};
use super::validation::{
    validate_driving_license, validate_education, validate_employment, validate_personal_info,
    ValidationError,
};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

pub fn step_title(step: u8) -> &'static str {
    match step {
        1 => "Personal Information",
        2 => "Education",
        3 => "Driving License",
        4 => "Employment History",
        _ => "Summary",
    }
}

/// Output of one step form, merged into the draft on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepSlice {
    PersonalInfo(PersonalInfo),
    Education(Vec<EducationRecord>),
    DrivingLicense(DrivingLicense),
    EmploymentHistory(Vec<EmploymentRecord>),
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application already submitted")]
    AlreadySubmitted,
}

/// Five-step intake wizard holding the draft and the current step index.
///
/// `complete_step` is the validated path: it derives the computed fields,
/// checks the step schema and its verification gate, merges the slice and
/// advances. `skip_forward`/`step_back` are the deliberate unvalidated
/// navigation affordance; both clamp the step index to `[FIRST_STEP, LAST_STEP]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationWizard {
    current_step: u8,
    draft: ApplicationDraft,
    submitted: Option<ApplicationId>,
}

impl Default for ApplicationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationWizard {
    pub fn new() -> Self {
        Self {
            current_step: FIRST_STEP,
            draft: ApplicationDraft::default(),
            submitted: None,
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn progress(&self) -> f32 {
        f32::from(self.current_step - FIRST_STEP) / f32::from(LAST_STEP - FIRST_STEP) * 100.0
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn submitted_id(&self) -> Option<&ApplicationId> {
        self.submitted.as_ref()
    }

    /// Validate a step slice, merge it into the draft and advance one step.
    pub fn complete_step(
        &mut self,
        slice: StepSlice,
        today: NaiveDate,
    ) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }

        match slice {
            StepSlice::PersonalInfo(mut info) => {
                info.age = Some(age_on(info.date_of_birth, today));
                validate_personal_info(&info)?;
                self.draft.personal_info = Some(info);
            }
            StepSlice::Education(mut records) => {
                for record in &mut records {
                    record.percentage = percentage(record.marks_obtained, record.maximum_marks);
                }
                validate_education(&records, today)?;
                self.draft.education = records;
            }
            StepSlice::DrivingLicense(license) => {
                validate_driving_license(&license)?;
                self.draft.driving_license = Some(license);
            }
            StepSlice::EmploymentHistory(records) => {
                validate_employment(&records)?;
                self.draft.employment_history = records;
            }
        }

        self.current_step = (self.current_step + 1).min(LAST_STEP);
        Ok(())
    }

    /// Move forward without validating the current step.
    pub fn skip_forward(&mut self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        self.current_step = (self.current_step + 1).min(LAST_STEP);
        Ok(())
    }

    /// Move back one step; the draft keeps whatever was already merged.
    pub fn step_back(&mut self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::AlreadySubmitted);
        }
        self.current_step = (self.current_step - 1).max(FIRST_STEP);
        Ok(())
    }

    /// Freeze the wizard after a successful submission; every mutating
    /// operation is rejected from here on.
    pub fn mark_submitted(&mut self, id: ApplicationId) {
        self.submitted = Some(id);
    }
}
