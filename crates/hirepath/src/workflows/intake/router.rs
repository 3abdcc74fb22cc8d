use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    ApplicationDraft, ApplicationId, DrivingLicense, EducationRecord, EmploymentRecord,
    PersonalInfo,
};
use super::service::{IntakeService, SubmissionError};
use super::wizard::{step_title, ApplicationWizard, StepSlice, WizardError};
use crate::auth::{IdentityProvider, Session, SessionRegistry};
use crate::error::AppError;
use crate::integrations::storage::DocumentStore;
use crate::integrations::verification::{
    DocumentPayload, IdentityCheck, LicenseCheck, VerificationGateway,
};

/// One authenticated wizard session: the draft-holding wizard plus the
/// verification outcomes obtained so far. Everything here is discarded when
/// the registry drops, mirroring the draft's reload-loses-everything contract.
pub struct WizardSession {
    pub user_id: String,
    pub wizard: ApplicationWizard,
    pub identity_check: Option<IdentityCheck>,
    pub license_check: Option<LicenseCheck>,
}

/// In-memory registry of open wizard sessions keyed by a generated id.
#[derive(Default)]
pub struct WizardRegistry {
    sequence: AtomicU64,
    sessions: Mutex<HashMap<String, WizardSession>>,
}

impl WizardRegistry {
    pub fn open(&self, user_id: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let session_id = format!("intake-{id:06}");
        let mut guard = self.sessions.lock().expect("wizard registry mutex poisoned");
        guard.insert(
            session_id.clone(),
            WizardSession {
                user_id: user_id.to_string(),
                wizard: ApplicationWizard::new(),
                identity_check: None,
                license_check: None,
            },
        );
        session_id
    }

    /// Run `f` against the caller's session; `None` when the session does not
    /// exist or belongs to a different user.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        user_id: &str,
        f: impl FnOnce(&mut WizardSession) -> T,
    ) -> Option<T> {
        let mut guard = self.sessions.lock().expect("wizard registry mutex poisoned");
        let session = guard.get_mut(session_id)?;
        if session.user_id != user_id {
            return None;
        }
        Some(f(session))
    }
}

/// Shared state behind the intake router.
pub struct IntakeRouterState<P, S, D, V> {
    pub identity: Arc<P>,
    pub service: Arc<IntakeService<S, D, V>>,
    pub sessions: Arc<SessionRegistry>,
    pub wizards: Arc<WizardRegistry>,
}

/// Wizard view returned by every session endpoint.
#[derive(Debug, Serialize)]
pub struct WizardSnapshot {
    pub session_id: String,
    pub current_step: u8,
    pub step_title: &'static str,
    pub progress: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_application_id: Option<ApplicationId>,
    pub draft: ApplicationDraft,
}

fn snapshot_of(session_id: &str, wizard: &ApplicationWizard) -> WizardSnapshot {
    WizardSnapshot {
        session_id: session_id.to_string(),
        current_step: wizard.current_step(),
        step_title: step_title(wizard.current_step()),
        progress: wizard.progress(),
        submitted_application_id: wizard.submitted_id().cloned(),
        draft: wizard.draft().clone(),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OtpRequest {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyCodeRequest {
    pub(crate) email: String,
    pub(crate) code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonalInfoStepRequest {
    pub(crate) personal_info: PersonalInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EducationStepRequest {
    pub(crate) education: Vec<EducationRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DrivingLicenseStepRequest {
    pub(crate) driving_license: DrivingLicense,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmploymentStepRequest {
    pub(crate) employment_history: Vec<EmploymentRecord>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum NavigationDirection {
    Next,
    Previous,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NavigateRequest {
    pub(crate) direction: NavigationDirection,
}

/// Router builder exposing the login flow and the wizard session endpoints.
pub fn intake_router<P, S, D, V>(state: Arc<IntakeRouterState<P, S, D, V>>) -> Router
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    Router::new()
        .route("/api/v1/auth/otp", post(request_code_handler::<P, S, D, V>))
        .route("/api/v1/auth/verify", post(verify_code_handler::<P, S, D, V>))
        .route(
            "/api/v1/intake/sessions",
            post(open_session_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(snapshot_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/steps/personal-info",
            post(personal_info_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/steps/education",
            post(education_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/steps/driving-license",
            post(driving_license_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/steps/employment-history",
            post(employment_history_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/navigate",
            post(navigate_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/documents",
            post(upload_document_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/verify-identity",
            post(verify_identity_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/verify-license",
            post(verify_license_handler::<P, S, D, V>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/submit",
            post(submit_handler::<P, S, D, V>),
        )
        .with_state(state)
}

pub(crate) async fn request_code_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Json(payload): Json<OtpRequest>,
) -> Result<Response, AppError>
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    state.identity.send_code(&payload.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "code_sent" })),
    )
        .into_response())
}

pub(crate) async fn verify_code_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Response, AppError>
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = state
        .identity
        .verify_code(&payload.email, &payload.code)
        .await?;
    state.sessions.store(session.clone());
    Ok((StatusCode::OK, Json(session)).into_response())
}

pub(crate) async fn open_session_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let session_id = state.wizards.open(&session.user_id);
    let snapshot = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            snapshot_of(&session_id, &ws.wizard)
        })
        .expect("freshly opened session exists");

    (StatusCode::CREATED, Json(snapshot)).into_response()
}

pub(crate) async fn snapshot_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    match state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            snapshot_of(&session_id, &ws.wizard)
        }) {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => session_not_found(&session_id),
    }
}

pub(crate) async fn personal_info_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<PersonalInfoStepRequest>,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let today = Local::now().date_naive();
    let outcome = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            let mut info = payload.personal_info;
            apply_identity_check(&mut info, ws.identity_check.as_ref());
            ws.wizard
                .complete_step(StepSlice::PersonalInfo(info), today)
                .map(|()| snapshot_of(&session_id, &ws.wizard))
        });

    step_outcome_response(&session_id, outcome)
}

pub(crate) async fn education_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EducationStepRequest>,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let today = Local::now().date_naive();
    let outcome = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            ws.wizard
                .complete_step(StepSlice::Education(payload.education), today)
                .map(|()| snapshot_of(&session_id, &ws.wizard))
        });

    step_outcome_response(&session_id, outcome)
}

pub(crate) async fn driving_license_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<DrivingLicenseStepRequest>,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let today = Local::now().date_naive();
    let outcome = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            let mut license = payload.driving_license;
            apply_license_check(&mut license, ws.license_check.as_ref());
            ws.wizard
                .complete_step(StepSlice::DrivingLicense(license), today)
                .map(|()| snapshot_of(&session_id, &ws.wizard))
        });

    step_outcome_response(&session_id, outcome)
}

pub(crate) async fn employment_history_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EmploymentStepRequest>,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let today = Local::now().date_naive();
    let outcome = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            ws.wizard
                .complete_step(
                    StepSlice::EmploymentHistory(payload.employment_history),
                    today,
                )
                .map(|()| snapshot_of(&session_id, &ws.wizard))
        });

    step_outcome_response(&session_id, outcome)
}

pub(crate) async fn navigate_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NavigateRequest>,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let outcome = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            let moved = match payload.direction {
                NavigationDirection::Next => ws.wizard.skip_forward(),
                NavigationDirection::Previous => ws.wizard.step_back(),
            };
            moved.map(|()| snapshot_of(&session_id, &ws.wizard))
        });

    step_outcome_response(&session_id, outcome)
}

pub(crate) async fn upload_document_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };
    if state
        .wizards
        .with_session(&session_id, &session.user_id, |_| ())
        .is_none()
    {
        return session_not_found(&session_id);
    }

    let form = match collect_multipart(multipart).await {
        Ok(form) => form,
        Err(message) => return unprocessable(&message),
    };

    let Some(folder) = form.fields.get("folder").filter(|f| !f.is_empty()) else {
        return unprocessable("missing 'folder' field");
    };
    let index = match form.fields.get("index").map(|raw| raw.parse::<usize>()) {
        Some(Ok(index)) => Some(index),
        Some(Err(_)) => return unprocessable("'index' must be a number"),
        None => None,
    };
    let Some(file) = form.files.get("file") else {
        return unprocessable("missing 'file' part");
    };

    match state
        .service
        .upload_document(folder, &file.file_name, file.bytes.clone(), index)
        .await
    {
        Ok(url) => (StatusCode::CREATED, Json(json!({ "url": url }))).into_response(),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn verify_identity_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut form = match collect_multipart(multipart).await {
        Ok(form) => form,
        Err(message) => return unprocessable(&message),
    };
    let (Some(aadhaar), Some(pan)) = (
        form.files.remove("aadhaar_file"),
        form.files.remove("pan_file"),
    ) else {
        return unprocessable("both 'aadhaar_file' and 'pan_file' are required");
    };

    let check = match state.service.verify_identity(aadhaar, pan).await {
        Ok(check) => check,
        Err(err) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    let recorded = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            ws.identity_check = Some(check.clone());
        });
    if recorded.is_none() {
        return session_not_found(&session_id);
    }

    (StatusCode::OK, Json(check)).into_response()
}

pub(crate) async fn verify_license_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let mut form = match collect_multipart(multipart).await {
        Ok(form) => form,
        Err(message) => return unprocessable(&message),
    };
    let Some(licence) = form.files.remove("licence_file") else {
        return unprocessable("missing 'licence_file' part");
    };

    let check = match state.service.verify_license(licence).await {
        Ok(check) => check,
        Err(err) => {
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    };

    let recorded = state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            ws.license_check = Some(check.clone());
        });
    if recorded.is_none() {
        return session_not_found(&session_id);
    }

    (StatusCode::OK, Json(check)).into_response()
}

pub(crate) async fn submit_handler<P, S, D, V>(
    State(state): State<Arc<IntakeRouterState<P, S, D, V>>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    P: IdentityProvider + 'static,
    S: super::repository::ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    let session = match authorize_request(&state.sessions, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let draft = match state
        .wizards
        .with_session(&session_id, &session.user_id, |ws| {
            if ws.wizard.is_submitted() {
                Err(WizardError::AlreadySubmitted)
            } else {
                Ok(ws.wizard.draft().clone())
            }
        }) {
        None => return session_not_found(&session_id),
        Some(Err(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "application already submitted" })),
            )
                .into_response()
        }
        Some(Ok(draft)) => draft,
    };

    match state.service.submit(&draft, &session.user_id).await {
        Ok(receipt) => {
            state
                .wizards
                .with_session(&session_id, &session.user_id, |ws| {
                    ws.wizard.mark_submitted(receipt.application_id.clone());
                });
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(SubmissionError::MissingPersonalInfo) => {
            unprocessable("personal information is incomplete")
        }
        Err(SubmissionError::Store(err)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

/// Merge the session's identity verification outcome into the step payload.
/// The verified flag always comes from the recorded check, never the client.
fn apply_identity_check(info: &mut PersonalInfo, check: Option<&IdentityCheck>) {
    info.identity_verified = check.map(|c| c.success).unwrap_or(false);
    if let Some(check) = check.filter(|c| c.success) {
        if let Some(name) = &check.aadhaar_name {
            info.full_name = name.clone();
        }
        if let Some(dob) = check.pan_dob {
            info.date_of_birth = dob;
        }
    }
}

/// Merge the session's licence verification outcome into the step payload;
/// extracted fields overwrite what the client typed.
fn apply_license_check(license: &mut DrivingLicense, check: Option<&LicenseCheck>) {
    license.license_verified =
        license.has_driving_license && check.map(|c| c.success).unwrap_or(false);
    if let Some(check) = check.filter(|c| c.success) {
        if let Some(number) = &check.licence_number {
            license.license_number = Some(number.clone());
        }
        if let Some(issued) = check.issue_date {
            license.license_issue_date = Some(issued);
        }
        if let Some(expires) = check.valid_till {
            license.license_expiry_date = Some(expires);
        }
    }
}

fn authorize_request(
    sessions: &SessionRegistry,
    headers: &HeaderMap,
) -> Result<Session, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) => sessions.authorize(token).map_err(|err| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "no active session" })),
        )
            .into_response()),
    }
}

fn step_outcome_response(
    session_id: &str,
    outcome: Option<Result<WizardSnapshot, WizardError>>,
) -> Response {
    match outcome {
        None => session_not_found(session_id),
        Some(Ok(snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Some(Err(WizardError::Validation(err))) => unprocessable(&err.to_string()),
        Some(Err(WizardError::AlreadySubmitted)) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "application already submitted" })),
        )
            .into_response(),
    }
}

fn session_not_found(session_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("unknown intake session '{session_id}'") })),
    )
        .into_response()
}

fn unprocessable(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": message })),
    )
        .into_response()
}

struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, DocumentPayload>,
}

async fn collect_multipart(mut multipart: Multipart) -> Result<MultipartForm, String> {
    let mut fields = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| err.to_string())?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(|f| f.to_string()) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(|err| err.to_string())?;
                files.insert(
                    name,
                    DocumentPayload {
                        file_name,
                        bytes: bytes.to_vec(),
                    },
                );
            }
            None => {
                let value = field.text().await.map_err(|err| err.to_string())?;
                fields.insert(name, value);
            }
        }
    }

    Ok(MultipartForm { fields, files })
}
