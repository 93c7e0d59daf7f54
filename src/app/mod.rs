mod auth;
mod config;
mod error;
mod fetcher;
mod logging;
mod reporter;
mod runtime;
#[cfg(test)]
mod testing;

pub use config::{AppConfig, LogFormat, MetricsTarget, PollerConfig};
pub use error::AppError;
pub use runtime::{CycleOutcome, PollError, PollMode, PollState, Poller};

use crate::domain::reading::Reading;

/// Continuous monitor: polls until a fatal error.
pub fn run() -> Result<(), AppError> {
    let config = bootstrap()?;
    runtime::run_monitor(&config)
}

/// Single-shot query; with `push_report` the reading is also sent to the
/// metrics backend and the healthcheck.
pub fn run_query(push_report: bool) -> Result<Option<Reading>, AppError> {
    let config = bootstrap()?;
    runtime::run_query(&config, push_report)
}

fn bootstrap() -> Result<AppConfig, AppError> {
    if let Err(error) = dotenvy::dotenv()
        && !error.not_found()
    {
        return Err(AppError::config(error));
    }

    let config = AppConfig::from_env()?;
    logging::init(config.log_format)?;

    tracing::info!(
        account_name = %config.credentials.account_name,
        share_base_url = %config.share_base_url,
        check_interval_secs = config.poller.check_interval.as_secs(),
        max_auth_fails = config.poller.max_auth_fails,
        max_fetch_fails = config.poller.max_fetch_fails,
        stat_name = %config.stat_name,
        metrics = config.metrics_backend(),
        healthcheck = config.healthcheck_url.is_some(),
        "application bootstrap initialized"
    );

    Ok(config)
}
