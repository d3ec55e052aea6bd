use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;

use hrms_attendance::attendance::AttendanceService;
use hrms_attendance::clock::{Clock, SystemClock};
use hrms_attendance::config::Config;
use hrms_attendance::db::init_store;
use hrms_attendance::docs::ApiDoc;
use hrms_attendance::routes;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = init_store(&config).await?;
    let service = Data::new(AttendanceService::new(
        store,
        config.work_policy,
        config.geofence_radius_meters,
    ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let server_addr = config.server_addr.clone();
    info!(
        %server_addr,
        radius_meters = config.geofence_radius_meters,
        work_start = %config.work_policy.work_start,
        work_end = %config.work_policy.work_end,
        "Attendance policy loaded"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(Data::from(clock.clone()))
            .app_data(Data::new(config.clone()))
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
