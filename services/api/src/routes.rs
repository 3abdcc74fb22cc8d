use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use hirepath::auth::IdentityProvider;
use hirepath::integrations::storage::DocumentStore;
use hirepath::integrations::verification::VerificationGateway;
use hirepath::workflows::intake::{
    intake_router, ApplicationStore, IntakeRouterState,
};

pub(crate) fn with_intake_routes<P, S, D, V>(
    state: Arc<IntakeRouterState<P, S, D, V>>,
) -> axum::Router
where
    P: IdentityProvider + 'static,
    S: ApplicationStore + 'static,
    D: DocumentStore + 'static,
    V: VerificationGateway + 'static,
{
    intake_router(state)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
