use crate::cli::ServeArgs;
use crate::infra::{load_configured_batch, AppState};
use crate::routes::router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use list_predict::config::AppConfig;
use list_predict::error::AppError;
use list_predict::scoring::RunContext;
use list_predict::telemetry;
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
    if let Some(input) = args.input.take() {
        config.scoring.input = Some(input);
    }
    if let Some(model) = args.model.take() {
        config.scoring.model = model;
    }

    telemetry::init(&config.telemetry)?;

    let context = RunContext::today();
    let batch = load_configured_batch(&config.scoring, &context)?;
    info!(
        records = batch.len(),
        excluded = batch.excluded(),
        model = batch.variant().label(),
        "startup batch scored"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        batch: Arc::new(batch),
        settings: Arc::new(config.scoring.clone()),
    };

    let app = router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "listing prediction service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
