use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leadgen::admin::{AdminSite, AdminState};
use leadgen::config::AppConfig;
use leadgen::db::Database;
use leadgen::error::AppError;
use leadgen::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.database.take() {
        config.database.path = path;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let site = AdminSite::lead_generation()?;
    let database = Database::new(config.database.path.clone());
    if !database.path().exists() {
        warn!(
            path = %database.path().display(),
            "database file not found; admin list views will fail until `db init` runs"
        );
    }
    let admin_state = Arc::new(AdminState {
        site: Arc::new(site),
        database,
    });

    let app = with_service_routes(admin_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead generation admin ready");

    axum::serve(listener, app).await?;
    Ok(())
}
