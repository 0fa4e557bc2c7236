use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use app_database::db_connect::initialize_db;
use app_error::{AppError, AppErrorExt};
use app_utils::email::mailer_from_config;
use micro_user::{
    AppState, create_routes,
    telemetry::{init_sentry, init_tracing, load_config},
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = load_config()?;

    let sentry_guard = init_sentry(&config.monitoring);
    init_tracing(&config.monitoring, sentry_guard.is_some())?;

    info!(
        "Starting contacts API ({} environment) at {}",
        config.environment,
        chrono::Utc::now()
    );

    let db = initialize_db(&config.database).await?;

    let mailer = mailer_from_config(&config.mail)
        .context("Failed to configure mailer")
        .config_err()?;

    let address = config.server.address();
    let app = create_routes(AppState::new(config, &db, mailer));

    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind to address: {}", address))
        .server_err()?;

    info!("Server listening on http://{}", address);
    axum::serve(listener, app)
        .await
        .context("Server error")
        .server_err()?;

    Ok(())
}
