use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use crate::adapters::share_http::{Credentials, ShareClient, ShareClientError, ShareResponse};
use crate::app::reporter::ReadingReporter;
use crate::domain::direction::Direction;
use crate::domain::reading::Reading;
use crate::domain::session_state::{Clock, EpochSeconds, Sleeper};

type Scripted = RefCell<VecDeque<Result<ShareResponse, ShareClientError>>>;

pub fn credentials() -> Credentials {
    Credentials {
        account_name: "alice".to_string(),
        password: "hunter2".to_string(),
        application_id: "app-id".to_string(),
    }
}

pub fn reading_at(sample_time: i64, bg: i64, lag: i64) -> Reading {
    Reading {
        bg,
        trend: 4,
        trend_english: Direction::Flat,
        reading_lag: lag,
        last_reading_time: EpochSeconds(sample_time),
    }
}

/// Share client replaying scripted responses. Logins default to a fresh
/// token once the script runs out.
#[derive(Default)]
pub struct FakeShareClient {
    logins: Scripted,
    fetches: Scripted,
    login_calls: Cell<usize>,
    fetched_sessions: RefCell<Vec<String>>,
}

impl FakeShareClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login(self, status: u16, body: &str) -> Self {
        self.logins.borrow_mut().push_back(Ok(ShareResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn with_login_error(self, error: ShareClientError) -> Self {
        self.logins.borrow_mut().push_back(Err(error));
        self
    }

    pub fn with_fetch(self, status: u16, body: &str) -> Self {
        self.fetches.borrow_mut().push_back(Ok(ShareResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn with_fetch_error(self, error: ShareClientError) -> Self {
        self.fetches.borrow_mut().push_back(Err(error));
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.get()
    }

    pub fn fetched_sessions(&self) -> Vec<String> {
        self.fetched_sessions.borrow().clone()
    }
}

impl ShareClient for FakeShareClient {
    fn login(&self, _credentials: &Credentials) -> Result<ShareResponse, ShareClientError> {
        let call = self.login_calls.get() + 1;
        self.login_calls.set(call);
        self.logins.borrow_mut().pop_front().unwrap_or_else(|| {
            Ok(ShareResponse {
                status: 200,
                body: format!("\"session-{call}\""),
            })
        })
    }

    fn latest_glucose(
        &self,
        session_id: &str,
        _application_id: &str,
    ) -> Result<ShareResponse, ShareClientError> {
        self.fetched_sessions.borrow_mut().push(session_id.to_string());
        self.fetches
            .borrow_mut()
            .pop_front()
            .expect("fetch script exhausted")
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> EpochSeconds {
        EpochSeconds(self.0)
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: RefCell<Vec<Reading>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<Reading> {
        self.reports.borrow().clone()
    }
}

impl ReadingReporter for RecordingReporter {
    fn report(&self, reading: &Reading) {
        self.reports.borrow_mut().push(reading.clone());
    }
}
