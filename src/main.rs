use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lms::config::Config;
use lms::db::init_db;
use lms::docs::ApiDoc;
use lms::external::mysql::{
    MySqlAuditSink, MySqlEmployeeDirectory, MySqlHolidayCalendar, MySqlLeaveTypeCatalog,
};
use lms::external::notify::TracingNotifier;
use lms::routes;
use lms::service::LeaveContext;
use lms::store::mysql::MySqlLeaveStore;

#[get("/")]
async fn index() -> impl Responder {
    "Leave management service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
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

    let pool = init_db(&config.database_url, config.db_max_connections).await?;

    let ctx = LeaveContext {
        store: Arc::new(MySqlLeaveStore::new(pool.clone())),
        catalog: Arc::new(MySqlLeaveTypeCatalog::new(
            pool.clone(),
            config.leave_type_cache_ttl,
        )),
        employees: Arc::new(MySqlEmployeeDirectory::new(pool.clone())),
        holidays: Arc::new(MySqlHolidayCalendar::new(pool.clone())),
        notifier: Arc::new(TracingNotifier),
        audit: Arc::new(MySqlAuditSink::new(pool)),
    };

    let server_addr = config.server_addr.clone();
    let ctx = Data::new(ctx);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(ctx.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
