//! Job-application intake workflow: the five-step wizard, per-step
//! validation, document upload and verification orchestration, and the final
//! three-table submission.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    age_on, percentage, ApplicationDraft, ApplicationId, DrivingLicense, EducationRecord,
    EmploymentRecord, MaritalStatus, PersonalInfo, EDUCATION_LEVELS, INDIAN_STATES,
    VEHICLE_CLASSES,
};
pub use repository::{
    ApplicationStore, NewApplication, NewEducationRow, NewEmploymentRow, StoreError,
};
pub use router::{
    intake_router, IntakeRouterState, WizardRegistry, WizardSession, WizardSnapshot,
};
pub use service::{IntakeService, SubmissionError, SubmissionReceipt};
pub use validation::{ValidationError, MAX_EMPLOYMENT_RECORDS};
pub use wizard::{
    step_title, ApplicationWizard, StepSlice, WizardError, FIRST_STEP, LAST_STEP,
};
