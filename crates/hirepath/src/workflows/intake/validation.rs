use chrono::{Datelike, NaiveDate};

use super::domain::{
    DrivingLicense, EducationRecord, EmploymentRecord, PersonalInfo, EDUCATION_LEVELS,
    INDIAN_STATES, VEHICLE_CLASSES,
};

pub const MAX_EMPLOYMENT_RECORDS: usize = 4;

const MIN_COMPLETION_YEAR: i32 = 1950;

/// Step schema breaches. Each step reports the first violation found so the
/// caller can surface a single actionable message.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("full name must be at least 2 characters")]
    FullNameTooShort,
    #[error("phone number must be a 10-digit Indian mobile number")]
    InvalidPhoneNumber,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("present address must be at least 10 characters")]
    AddressTooShort,
    #[error("unknown state: {0}")]
    UnknownState(String),
    #[error("identity verification is required before continuing")]
    IdentityNotVerified,
    #[error("at least one education record is required")]
    MissingEducation,
    #[error("unknown education level: {0}")]
    UnknownEducationLevel(String),
    #[error("institution name must be at least 2 characters")]
    InstitutionNameTooShort,
    #[error("institution address must be at least 5 characters")]
    InstitutionAddressTooShort,
    #[error("completion year {0} is out of range")]
    CompletionYearOutOfRange(i32),
    #[error("completion month {0} is out of range")]
    CompletionMonthOutOfRange(u8),
    #[error("marks obtained cannot be negative")]
    NegativeMarks,
    #[error("maximum marks must be at least 1")]
    MaximumMarksTooLow,
    #[error("all licence fields are required when a driving licence is held")]
    IncompleteLicenseDetails,
    #[error("unknown vehicle class: {0}")]
    UnknownVehicleClass(String),
    #[error("licence verification is required before continuing")]
    LicenseNotVerified,
    #[error("at most {max} employment records are allowed, found {found}")]
    TooManyEmploymentRecords { max: usize, found: usize },
    #[error("employer name must be at least 2 characters")]
    EmployerNameTooShort,
    #[error("designation must be at least 2 characters")]
    DesignationTooShort,
    #[error("employer address must be at least 5 characters")]
    EmployerAddressTooShort,
}

pub fn validate_personal_info(info: &PersonalInfo) -> Result<(), ValidationError> {
    if info.full_name.trim().chars().count() < 2 {
        return Err(ValidationError::FullNameTooShort);
    }
    if !is_indian_mobile(&info.phone_number) {
        return Err(ValidationError::InvalidPhoneNumber);
    }
    if !is_plausible_email(&info.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if info.present_address.trim().chars().count() < 10 {
        return Err(ValidationError::AddressTooShort);
    }
    if !INDIAN_STATES.contains(&info.state.as_str()) {
        return Err(ValidationError::UnknownState(info.state.clone()));
    }
    if !info.identity_verified {
        return Err(ValidationError::IdentityNotVerified);
    }
    Ok(())
}

pub fn validate_education(
    records: &[EducationRecord],
    today: NaiveDate,
) -> Result<(), ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::MissingEducation);
    }

    for record in records {
        if !EDUCATION_LEVELS.contains(&record.level_of_education.as_str()) {
            return Err(ValidationError::UnknownEducationLevel(
                record.level_of_education.clone(),
            ));
        }
        if record.institution_name.trim().chars().count() < 2 {
            return Err(ValidationError::InstitutionNameTooShort);
        }
        if record.institution_address.trim().chars().count() < 5 {
            return Err(ValidationError::InstitutionAddressTooShort);
        }
        if record.completion_year < MIN_COMPLETION_YEAR || record.completion_year > today.year() {
            return Err(ValidationError::CompletionYearOutOfRange(
                record.completion_year,
            ));
        }
        if record.completion_month < 1 || record.completion_month > 12 {
            return Err(ValidationError::CompletionMonthOutOfRange(
                record.completion_month,
            ));
        }
        if record.marks_obtained < 0.0 {
            return Err(ValidationError::NegativeMarks);
        }
        if record.maximum_marks < 1.0 {
            return Err(ValidationError::MaximumMarksTooLow);
        }
    }

    Ok(())
}

pub fn validate_driving_license(license: &DrivingLicense) -> Result<(), ValidationError> {
    if !license.has_driving_license {
        return Ok(());
    }

    let complete = non_empty(license.license_number.as_deref())
        && license.license_issue_date.is_some()
        && license.license_expiry_date.is_some()
        && non_empty(license.issuing_authority.as_deref());
    if !complete {
        return Err(ValidationError::IncompleteLicenseDetails);
    }

    for class in &license.vehicle_classes {
        if !VEHICLE_CLASSES.contains(&class.as_str()) {
            return Err(ValidationError::UnknownVehicleClass(class.clone()));
        }
    }

    if !license.license_verified {
        return Err(ValidationError::LicenseNotVerified);
    }

    Ok(())
}

pub fn validate_employment(records: &[EmploymentRecord]) -> Result<(), ValidationError> {
    if records.len() > MAX_EMPLOYMENT_RECORDS {
        return Err(ValidationError::TooManyEmploymentRecords {
            max: MAX_EMPLOYMENT_RECORDS,
            found: records.len(),
        });
    }

    for record in records {
        if record.employer_name.trim().chars().count() < 2 {
            return Err(ValidationError::EmployerNameTooShort);
        }
        if record.designation.trim().chars().count() < 2 {
            return Err(ValidationError::DesignationTooShort);
        }
        if record.address.trim().chars().count() < 5 {
            return Err(ValidationError::EmployerAddressTooShort);
        }
    }

    Ok(())
}

fn non_empty(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn is_indian_mobile(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.len() == 10
        && trimmed.starts_with(['6', '7', '8', '9'])
        && trimmed.chars().all(|c| c.is_ascii_digit())
}

fn is_plausible_email(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
