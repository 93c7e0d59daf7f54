use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::adapters::datadog::DatadogHttpSink;
use crate::adapters::healthcheck::{HealthcheckClient, HealthcheckPing};
use crate::adapters::metrics::MetricsSink;
use crate::adapters::share_http::{Credentials, ShareClient, ShareClientError, ShareHttpClient};
use crate::adapters::statsd::StatsdUdpSink;
use crate::app::auth::{AuthError, authenticate};
use crate::app::config::{AppConfig, MetricsTarget, PollerConfig};
use crate::app::error::AppError;
use crate::app::fetcher::{FetchError, FetchOutcome, fetch_latest};
use crate::app::reporter::{MetricsReporter, ReadingReporter};
use crate::domain::backoff::backoff_delay;
use crate::domain::reading::{ParseError, Reading, parse_latest_glucose};
use crate::domain::session_state::{Clock, EpochSeconds, SessionStore, Sleeper};

#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochSeconds {
        EpochSeconds(Utc::now().timestamp())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Auth(AuthError),
    #[error(transparent)]
    Fetch(FetchError),
    #[error("share service unreachable: {0}")]
    Connection(ShareClientError),
    #[error("unusable glucose payload ({error}): {body}")]
    Parse { error: ParseError, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    Continuous,
    SingleShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    NeedAuth,
    NeedFetch,
    HaveReading,
    BackoffFetch,
    BackoffConn,
    Terminated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Reported(Reading),
    Duplicate(Reading),
    Queried(Option<Reading>),
    Unparsed,
    FetchBackoff { failures: u32, delay: Duration },
    ConnectionBackoff,
}

pub struct Poller<C, R, Cl, S> {
    client: C,
    reporter: R,
    clock: Cl,
    sleeper: S,
    credentials: Credentials,
    config: PollerConfig,
    session: SessionStore,
    fetch_failures: u32,
    state: PollState,
    runs: u64,
}

impl<C, R, Cl, S> Poller<C, R, Cl, S>
where
    C: ShareClient,
    R: ReadingReporter,
    Cl: Clock,
    S: Sleeper,
{
    pub fn new(
        client: C,
        reporter: R,
        clock: Cl,
        sleeper: S,
        credentials: Credentials,
        config: PollerConfig,
    ) -> Self {
        Self {
            client,
            reporter,
            clock,
            sleeper,
            credentials,
            config,
            session: SessionStore::new(),
            fetch_failures: 0,
            state: PollState::NeedAuth,
            runs: 0,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn fetch_failures(&self) -> u32 {
        self.fetch_failures
    }

    /// Polls until a fatal error; transient failures are absorbed.
    pub fn run(&mut self) -> Result<(), PollError> {
        loop {
            self.cycle(PollMode::Continuous)?;
            self.sleeper.sleep(self.config.check_interval);
        }
    }

    /// One cycle without de-duplication or reporting; every failure is
    /// surfaced to the caller.
    pub fn query_once(&mut self) -> Result<Option<Reading>, PollError> {
        match self.cycle(PollMode::SingleShot)? {
            CycleOutcome::Queried(reading) => Ok(reading),
            outcome @ (CycleOutcome::Reported(_)
            | CycleOutcome::Duplicate(_)
            | CycleOutcome::Unparsed
            | CycleOutcome::FetchBackoff { .. }
            | CycleOutcome::ConnectionBackoff) => {
                unreachable!("continuous-only outcome in single-shot mode: {outcome:?}")
            }
        }
    }

    /// Single-shot query that optionally pushes the reading to the reporter.
    /// `last_seen` is left alone so the monitor still reports it.
    pub fn query_and_report(&mut self, push_report: bool) -> Result<Option<Reading>, PollError> {
        let reading = self.query_once()?;

        if push_report && let Some(reading) = &reading {
            self.reporter.report(reading);
        }

        Ok(reading)
    }

    pub fn cycle(&mut self, mode: PollMode) -> Result<CycleOutcome, PollError> {
        self.runs += 1;
        tracing::info!(
            run = self.runs,
            fetch_failures = self.fetch_failures,
            "poll cycle starting"
        );

        let token = match self.session.token() {
            Some(token) => token.to_string(),
            None => {
                self.state = PollState::NeedAuth;
                match authenticate(&self.client, &self.sleeper, &self.credentials, &self.config) {
                    Ok(token) => {
                        self.session.activate(token.clone());
                        token
                    }
                    Err(AuthError::Connection(error)) => {
                        return self.connection_failed(error, mode);
                    }
                    Err(error) => {
                        self.state = PollState::Terminated;
                        return Err(PollError::Auth(error));
                    }
                }
            }
        };

        self.state = PollState::NeedFetch;
        let outcome = match fetch_latest(&self.client, &token, &self.credentials.application_id) {
            Ok(outcome) => outcome,
            Err(error) => return self.connection_failed(error, mode),
        };

        match outcome {
            FetchOutcome::Rejected(error) => self.fetch_rejected(error, mode),
            FetchOutcome::Fetched(body) => {
                self.fetch_failures = 0;
                self.handle_body(&body, mode)
            }
        }
    }

    fn connection_failed(
        &mut self,
        error: ShareClientError,
        mode: PollMode,
    ) -> Result<CycleOutcome, PollError> {
        self.session.invalidate();

        if mode == PollMode::SingleShot {
            self.state = PollState::Terminated;
            return Err(PollError::Connection(error));
        }

        self.state = PollState::BackoffConn;
        tracing::warn!(
            error = %error,
            retry_delay_secs = self.config.retry_delay.as_secs(),
            "share service unreachable, retrying"
        );
        self.sleeper.sleep(self.config.retry_delay);
        Ok(CycleOutcome::ConnectionBackoff)
    }

    fn fetch_rejected(
        &mut self,
        error: FetchError,
        mode: PollMode,
    ) -> Result<CycleOutcome, PollError> {
        self.fetch_failures += 1;

        if mode == PollMode::SingleShot || self.fetch_failures > self.config.max_fetch_fails {
            tracing::error!(
                status = error.status,
                body = %error.body,
                failures = self.fetch_failures,
                "share fetch failed, giving up"
            );
            self.session.invalidate();
            self.fetch_failures = 0;
            self.state = PollState::Terminated;
            return Err(PollError::Fetch(error));
        }

        self.state = PollState::BackoffFetch;
        if self.fetch_failures > self.config.max_fetch_fails / 2 {
            tracing::warn!(
                status = error.status,
                failures = self.fetch_failures,
                "share fetch failed, re-authenticating"
            );
            self.session.invalidate();
        } else {
            tracing::warn!(
                status = error.status,
                failures = self.fetch_failures,
                "share fetch failed, trying again"
            );
        }

        let delay = backoff_delay(self.fetch_failures, self.config.max_backoff);
        self.sleeper.sleep(delay);
        Ok(CycleOutcome::FetchBackoff {
            failures: self.fetch_failures,
            delay,
        })
    }

    fn handle_body(&mut self, body: &str, mode: PollMode) -> Result<CycleOutcome, PollError> {
        let reading = match parse_latest_glucose(body, self.clock.now()) {
            Ok(reading) => reading,
            Err(error) if error.is_recoverable() => {
                self.session.invalidate();
                tracing::error!(error = %error, body = %body, "latest glucose response unusable");
                return Ok(match mode {
                    PollMode::SingleShot => {
                        self.state = PollState::Terminated;
                        CycleOutcome::Queried(None)
                    }
                    PollMode::Continuous => CycleOutcome::Unparsed,
                });
            }
            Err(error) => {
                self.state = PollState::Terminated;
                tracing::error!(error = %error, body = %body, "trend outside direction table");
                return Err(PollError::Parse {
                    error,
                    body: body.to_string(),
                });
            }
        };

        self.state = PollState::HaveReading;
        tracing::info!(
            bg = reading.bg,
            trend = %reading.trend_english,
            lag_secs = reading.reading_lag,
            "latest glucose reading"
        );
        if reading.is_stale(self.config.max_reading_lag) {
            tracing::warn!(
                minutes = reading.reading_lag / 60,
                "no new measurement from the sensor for a while"
            );
        }

        if mode == PollMode::SingleShot {
            self.state = PollState::Terminated;
            return Ok(CycleOutcome::Queried(Some(reading)));
        }

        if !self.session.is_newer(reading.last_reading_time) {
            tracing::debug!(
                sample_time = reading.last_reading_time.0,
                "reading already reported"
            );
            return Ok(CycleOutcome::Duplicate(reading));
        }

        self.reporter.report(&reading);
        self.session.mark_seen(reading.last_reading_time);
        // Every successful report starts the next cycle with a fresh login.
        self.session.retire();
        Ok(CycleOutcome::Reported(reading))
    }
}

pub type SharePoller = Poller<ShareHttpClient, MetricsReporter, SystemClock, ThreadSleeper>;

pub fn build_poller(config: &AppConfig) -> Result<SharePoller, AppError> {
    let client = ShareHttpClient::new(&config.share_base_url, config.request_timeout)
        .map_err(AppError::runtime)?;

    Ok(Poller::new(
        client,
        build_reporter(config)?,
        SystemClock,
        ThreadSleeper,
        config.credentials.clone(),
        config.poller.clone(),
    ))
}

fn build_reporter(config: &AppConfig) -> Result<MetricsReporter, AppError> {
    let sink: Box<dyn MetricsSink> = match &config.metrics {
        MetricsTarget::Statsd { address } => {
            Box::new(StatsdUdpSink::new(address).map_err(AppError::runtime)?)
        }
        MetricsTarget::DatadogHttp { site_url, api_key } => Box::new(
            DatadogHttpSink::new(site_url, api_key, config.request_timeout)
                .map_err(AppError::runtime)?,
        ),
    };

    let healthcheck = match &config.healthcheck_url {
        Some(url) => {
            let client =
                HealthcheckClient::new(url, config.request_timeout).map_err(AppError::runtime)?;
            Some(Box::new(client) as Box<dyn HealthcheckPing>)
        }
        None => None,
    };

    Ok(MetricsReporter::new(sink, healthcheck, config.stat_name.clone()))
}

pub fn run_monitor(config: &AppConfig) -> Result<(), AppError> {
    let mut poller = build_poller(config)?;
    poller.run().map_err(AppError::from)
}

pub fn run_query(config: &AppConfig, push_report: bool) -> Result<Option<Reading>, AppError> {
    let mut poller = build_poller(config)?;
    poller.query_and_report(push_report).map_err(AppError::from)
}
