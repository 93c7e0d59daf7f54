use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct EpochSeconds(pub i64);

pub trait Clock {
    fn now(&self) -> EpochSeconds;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionToken {
    #[default]
    Absent,
    Active(String),
    /// Token used for a successful report; the next cycle logs in again.
    Retired,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    token: SessionToken,
    last_seen: EpochSeconds,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_auth(&self) -> bool {
        !matches!(self.token, SessionToken::Active(_))
    }

    pub fn token(&self) -> Option<&str> {
        match &self.token {
            SessionToken::Active(token) => Some(token),
            SessionToken::Absent | SessionToken::Retired => None,
        }
    }

    pub fn state(&self) -> &SessionToken {
        &self.token
    }

    pub fn activate(&mut self, token: String) {
        self.token = SessionToken::Active(token);
    }

    pub fn invalidate(&mut self) {
        self.token = SessionToken::Absent;
    }

    pub fn retire(&mut self) {
        self.token = SessionToken::Retired;
    }

    pub fn last_seen(&self) -> EpochSeconds {
        self.last_seen
    }

    pub fn is_newer(&self, sample_time: EpochSeconds) -> bool {
        sample_time > self.last_seen
    }

    pub fn mark_seen(&mut self, sample_time: EpochSeconds) {
        self.last_seen = self.last_seen.max(sample_time);
    }
}
