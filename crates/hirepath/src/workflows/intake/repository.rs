use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, MaritalStatus};

/// Flattened personal + licence fields written to the `applications` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub age: Option<u8>,
    pub phone_number: String,
    pub email: String,
    pub present_address: String,
    pub state: String,
    pub marital_status: MaritalStatus,
    pub number_of_children: u8,
    pub aadhaar_card_url: Option<String>,
    pub pan_card_url: Option<String>,
    pub identity_verified: bool,
    pub has_driving_license: bool,
    pub license_number: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
    pub license_expiry_date: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
    pub vehicle_classes: Vec<String>,
    pub driving_license_url: Option<String>,
    pub license_verified: bool,
    pub status: String,
    pub current_step: u8,
}

/// Child row of `education`, referencing the application by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEducationRow {
    pub application_id: ApplicationId,
    pub level_of_education: String,
    pub institution_name: String,
    pub institution_address: String,
    pub completion_year: i32,
    pub completion_month: u8,
    pub marks_obtained: f64,
    pub maximum_marks: f64,
    pub percentage: f64,
    pub certificate_url: Option<String>,
}

/// Child row of `employment_history`, referencing the application by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEmploymentRow {
    pub application_id: ApplicationId,
    pub employer_name: String,
    pub designation: String,
    pub address: String,
    pub joining_date: NaiveDate,
    pub leaving_date: Option<NaiveDate>,
    pub take_home_salary: Option<u32>,
    pub reason_for_leaving: Option<String>,
    pub may_contact_employer: bool,
    pub certificate_url: Option<String>,
}

/// Storage abstraction over the three-table relational backend so the
/// submission path can be exercised in isolation.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert_application(&self, row: NewApplication)
        -> Result<ApplicationId, StoreError>;

    async fn insert_education(&self, rows: Vec<NewEducationRow>) -> Result<(), StoreError>;

    async fn insert_employment(&self, rows: Vec<NewEmploymentRow>) -> Result<(), StoreError>;
}

/// Error enumeration for relational-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} insert rejected: {message}")]
    Rejected {
        table: &'static str,
        message: String,
    },
    #[error("application store unavailable: {0}")]
    Unavailable(String),
}
