use anyhow::Context;
use std::borrow::Cow;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

use app_config::{AppConfig, MonitoringConfig};
use app_error::{AppErrorExt, AppResult};

/// Run `f` with a plain stderr-style subscriber installed for the current thread.
/// Used before the configured subscriber exists.
pub fn with_startup_logging<W, T>(filter: EnvFilter, writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Load the configuration with its own warnings visible
pub fn load_config() -> AppResult<AppConfig> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    with_startup_logging(filter, std::io::stderr, AppConfig::load)
}

pub fn init_sentry(monitoring: &MonitoringConfig) -> Option<sentry::ClientInitGuard> {
    let sentry_config = &monitoring.sentry;
    if sentry_config.dsn.is_empty() {
        return None;
    }

    Some(sentry::init((
        sentry_config.dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(Cow::Owned(sentry_config.environment.clone())),
            sample_rate: sentry_config.sample_rate,
            traces_sample_rate: sentry_config.traces_sample_rate,
            ..Default::default()
        },
    )))
}

pub fn init_tracing(monitoring: &MonitoringConfig, with_sentry: bool) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&monitoring.logging.level))
        .context("Invalid log filter")
        .config_err()?;

    let fmt_layer = if monitoring.logging.format == "compact" {
        tracing_subscriber::fmt::layer().compact().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(with_sentry.then(sentry_tracing::layer))
        .try_init()
        .context("Failed to set tracing subscriber")
        .server_err()
}
