use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use hirepath::auth::{RestIdentityProvider, SessionRegistry};
use hirepath::config::AppConfig;
use hirepath::error::AppError;
use hirepath::integrations::{
    RestApplicationStore, RestDocumentStore, RestVerificationGateway,
};
use hirepath::telemetry;
use hirepath::workflows::intake::{IntakeRouterState, IntakeService, WizardRegistry};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let intake_state = Arc::new(IntakeRouterState {
        identity: Arc::new(RestIdentityProvider::new(&config.backend)),
        service: Arc::new(IntakeService::new(
            Arc::new(RestApplicationStore::new(&config.backend)),
            Arc::new(RestDocumentStore::new(&config.backend)),
            Arc::new(RestVerificationGateway::new(&config.verification)),
        )),
        sessions: Arc::new(SessionRegistry::default()),
        wizards: Arc::new(WizardRegistry::default()),
    });

    let app = with_intake_routes(intake_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "job application intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
