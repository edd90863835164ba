use crate::cli::ServeArgs;
use crate::infra::{AppState, ConfiguredRepository};
use crate::routes::with_commission_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use commission_engine::commission::CommissionService;
use commission_engine::config::AppConfig;
use commission_engine::error::AppError;
use commission_engine::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let repository = ConfiguredRepository::from_data_dir(config.commission.data_dir.as_deref());
    let storage = repository.describe();
    let commission_service = Arc::new(CommissionService::new(
        Arc::new(repository),
        config.commission.products.clone(),
    ));

    let app = with_commission_routes(commission_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        %storage,
        products = config.commission.products.len(),
        "commission engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
