use crate::infra::{
    InMemoryApplicationStore, InMemoryDocumentStore, InMemoryIdentityProvider,
    ScriptedVerificationGateway,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

use hirepath::auth::LoginFlow;
use hirepath::error::AppError;
use hirepath::integrations::verification::DocumentPayload;
use hirepath::workflows::intake::{
    step_title, ApplicationWizard, DrivingLicense, EducationRecord, EmploymentRecord,
    IntakeService, MaritalStatus, PersonalInfo, StepSlice,
};

const DEMO_CODE: &str = "424242";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the date used for derived fields (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Include a verified driving licence in the sample application.
    #[arg(long)]
    pub(crate) with_license: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    println!("Job application intake demo");

    let provider = Arc::new(InMemoryIdentityProvider::default());
    let mut flow = LoginFlow::new(provider);
    flow.submit_email("supervisor@example.com").await?;
    println!("- One-time code sent to supervisor@example.com (demo code {DEMO_CODE})");
    let session = flow.submit_code(DEMO_CODE).await?;
    println!("- Authenticated as {} ({})", session.email, session.user_id);

    let store = Arc::new(InMemoryApplicationStore::default());
    let verification = ScriptedVerificationGateway::default();
    let identity_check = verification.identity.clone();
    let license_check = verification.license.clone();
    let service = IntakeService::new(
        store.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        Arc::new(verification),
    );

    let aadhaar_url = match service
        .upload_document("aadhaar", "aadhaar.png", b"demo-aadhaar".to_vec(), None)
        .await
    {
        Ok(url) => url,
        Err(err) => {
            println!("  Upload failed: {err}");
            return Ok(());
        }
    };
    let pan_url = match service
        .upload_document("pan", "pan.png", b"demo-pan".to_vec(), None)
        .await
    {
        Ok(url) => url,
        Err(err) => {
            println!("  Upload failed: {err}");
            return Ok(());
        }
    };
    println!("- Uploaded identity documents");
    println!("    {aadhaar_url}");
    println!("    {pan_url}");

    let check = match service
        .verify_identity(
            DocumentPayload {
                file_name: "aadhaar.png".to_string(),
                bytes: b"demo-aadhaar".to_vec(),
            },
            DocumentPayload {
                file_name: "pan.png".to_string(),
                bytes: b"demo-pan".to_vec(),
            },
        )
        .await
    {
        Ok(check) => check,
        Err(err) => {
            println!("  Identity verification unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "- Identity verification: success={} name={} dob={}",
        check.success,
        check.aadhaar_name.as_deref().unwrap_or("n/a"),
        check
            .pan_dob
            .map(|d| d.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
    );

    let mut wizard = ApplicationWizard::new();

    let mut personal = sample_personal_info(aadhaar_url, pan_url);
    personal.identity_verified = identity_check.success;
    if !step(&mut wizard, StepSlice::PersonalInfo(personal), today) {
        return Ok(());
    }
    if !step(
        &mut wizard,
        StepSlice::Education(vec![sample_education()]),
        today,
    ) {
        return Ok(());
    }

    let license = if args.with_license {
        let mut license = sample_license();
        license.license_number = license_check.licence_number.clone();
        license.license_issue_date = license_check.issue_date;
        license.license_expiry_date = license_check.valid_till;
        license.license_verified = license_check.success;
        license
    } else {
        DrivingLicense::default()
    };
    if !step(&mut wizard, StepSlice::DrivingLicense(license), today) {
        return Ok(());
    }
    if !step(
        &mut wizard,
        StepSlice::EmploymentHistory(vec![
            sample_employment("Acme Logistics"),
            sample_employment("Bharat Transport Co"),
        ]),
        today,
    ) {
        return Ok(());
    }

    println!(
        "- Wizard at step {}/5 ({:.0}% complete)",
        wizard.current_step(),
        wizard.progress()
    );

    let receipt = match service.submit(wizard.draft(), &session.user_id).await {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    wizard.mark_submitted(receipt.application_id.clone());

    println!(
        "- Submitted application {} ({} education, {} employment rows)",
        receipt.application_id.0, receipt.education_rows, receipt.employment_rows
    );

    if let Some((_, row)) = store.applications().first() {
        match serde_json::to_string_pretty(row) {
            Ok(json) => println!("  Stored application row:\n{json}"),
            Err(err) => println!("  Stored application row unavailable: {err}"),
        }
    }
    println!(
        "  Child rows stored: {} education, {} employment",
        store.education_rows().len(),
        store.employment_rows().len()
    );

    Ok(())
}

fn step(wizard: &mut ApplicationWizard, slice: StepSlice, today: NaiveDate) -> bool {
    let title = step_title(wizard.current_step());
    match wizard.complete_step(slice, today) {
        Ok(()) => {
            println!("- Completed step: {title}");
            true
        }
        Err(err) => {
            println!("  Step '{title}' rejected: {err}");
            false
        }
    }
}

fn sample_personal_info(aadhaar_url: String, pan_url: String) -> PersonalInfo {
    PersonalInfo {
        full_name: "Asha Verma".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1997, 6, 15).expect("valid date"),
        age: None,
        phone_number: "9876543210".to_string(),
        email: "asha.verma@example.com".to_string(),
        present_address: "12 MG Road, Indiranagar, Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        marital_status: MaritalStatus::Single,
        number_of_children: 0,
        aadhaar_card_url: Some(aadhaar_url),
        pan_card_url: Some(pan_url),
        identity_verified: false,
    }
}

fn sample_education() -> EducationRecord {
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

fn sample_license() -> DrivingLicense {
    DrivingLicense {
        has_driving_license: true,
        license_number: None,
        license_issue_date: None,
        license_expiry_date: None,
        issuing_authority: Some("RTO Bengaluru".to_string()),
        vehicle_classes: vec!["LMV (Light Motor Vehicle)".to_string()],
        driving_license_url: None,
        license_verified: false,
    }
}

fn sample_employment(employer: &str) -> EmploymentRecord {
    EmploymentRecord {
        employer_name: employer.to_string(),
        designation: "Field Supervisor".to_string(),
        address: "Industrial Area, Pune".to_string(),
        joining_date: NaiveDate::from_ymd_opt(2019, 1, 7).expect("valid date"),
        leaving_date: Some(NaiveDate::from_ymd_opt(2022, 8, 31).expect("valid date")),
        take_home_salary: Some(32_000),
        reason_for_leaving: Some("Relocation".to_string()),
        may_contact_employer: true,
        certificate_url: None,
    }
}
