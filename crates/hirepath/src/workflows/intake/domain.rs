use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the relational store when an application row is
/// created at final submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Education levels offered by the intake form.
pub const EDUCATION_LEVELS: [&str; 5] = [
    "SSLC",
    "Intermediate/ITI",
    "Diploma",
    "Graduation",
    "Post-Graduation",
];

/// Vehicle classes a driving licence can authorize.
pub const VEHICLE_CLASSES: [&str; 6] = [
    "LMV (Light Motor Vehicle)",
    "HMV (Heavy Motor Vehicle)",
    "3W (Three Wheeler)",
    "2W (Two Wheeler)",
    "TRANS (Transport Vehicle)",
    "PSV (Public Service Vehicle)",
];

/// States selectable on the personal information step.
pub const INDIAN_STATES: [&str; 36] = [
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Married,
}

/// Identity slice collected on step one, including the uploaded document URLs
/// and the verification outcome gating the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    /// Derived from `date_of_birth` when the step is completed.
    #[serde(default)]
    pub age: Option<u8>,
    pub phone_number: String,
    pub email: String,
    pub present_address: String,
    pub state: String,
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub number_of_children: u8,
    #[serde(default)]
    pub aadhaar_card_url: Option<String>,
    #[serde(default)]
    pub pan_card_url: Option<String>,
    #[serde(default)]
    pub identity_verified: bool,
}

/// One qualification entry; the step collects at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub level_of_education: String,
    pub institution_name: String,
    pub institution_address: String,
    pub completion_year: i32,
    pub completion_month: u8,
    pub marks_obtained: f64,
    pub maximum_marks: f64,
    /// Derived from the raw marks when the step is completed.
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

/// Licence slice; substructure fields are only meaningful when
/// `has_driving_license` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrivingLicense {
    pub has_driving_license: bool,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub license_issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub license_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub issuing_authority: Option<String>,
    #[serde(default)]
    pub vehicle_classes: Vec<String>,
    #[serde(default)]
    pub driving_license_url: Option<String>,
    #[serde(default)]
    pub license_verified: bool,
}

/// One prior employer; the step accepts between zero and four.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub employer_name: String,
    pub designation: String,
    pub address: String,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub leaving_date: Option<NaiveDate>,
    #[serde(default)]
    pub take_home_salary: Option<u32>,
    #[serde(default)]
    pub reason_for_leaving: Option<String>,
    #[serde(default)]
    pub may_contact_employer: bool,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

/// In-memory application draft accumulated by the wizard. It lives only for
/// the wizard session and is discarded unless submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub education: Vec<EducationRecord>,
    pub driving_license: Option<DrivingLicense>,
    #[serde(default)]
    pub employment_history: Vec<EmploymentRecord>,
}

/// Whole years completed between `date_of_birth` and `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u8 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.clamp(0, u8::MAX as i32) as u8
}

/// Marks expressed as a percentage; zero when `maximum_marks` is zero.
pub fn percentage(marks_obtained: f64, maximum_marks: f64) -> f64 {
    if maximum_marks > 0.0 {
        marks_obtained / maximum_marks * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn age_on_the_eighteenth_birthday_is_eighteen() {
        assert_eq!(age_on(date(2007, 6, 15), date(2025, 6, 15)), 18);
    }

    #[test]
    fn age_one_day_before_the_birthday_is_seventeen() {
        assert_eq!(age_on(date(2007, 6, 15), date(2025, 6, 14)), 17);
    }

    #[test]
    fn age_never_goes_negative() {
        assert_eq!(age_on(date(2030, 1, 1), date(2025, 6, 14)), 0);
    }

    #[test]
    fn percentage_of_valid_marks() {
        assert!((percentage(450.0, 500.0) - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_with_zero_maximum_is_zero() {
        assert_eq!(percentage(450.0, 0.0), 0.0);
    }
}
