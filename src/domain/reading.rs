use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::direction::Direction;
use crate::domain::session_state::EpochSeconds;

const SAMPLE_TIME_KEY: &str = "ST";
const TREND_KEY: &str = "Trend";
const VALUE_KEY: &str = "Value";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Glucose value in mg/dL.
    pub bg: i64,
    pub trend: u8,
    pub trend_english: Direction,
    /// Seconds between the sensor sample and the moment it was parsed.
    pub reading_lag: i64,
    pub last_reading_time: EpochSeconds,
}

impl Reading {
    pub fn is_stale(&self, max_lag: Duration) -> bool {
        self.reading_lag > 0 && self.reading_lag as u64 > max_lag.as_secs()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response must be a JSON array")]
    InvalidPayloadType,
    #[error("response contains no readings")]
    EmptyResponse,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field {0} has an unexpected value")]
    InvalidField(&'static str),
    #[error("trend code {0} is not in the direction table")]
    UnknownTrend(i64),
    #[error("trend label {0:?} is not in the direction table")]
    UnknownTrendLabel(String),
}

impl ParseError {
    /// Shape problems with the payload are recoverable; an unmapped trend
    /// means the direction table no longer matches the service.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::UnknownTrend(_) | Self::UnknownTrendLabel(_))
    }
}

pub fn parse_latest_glucose(body: &str, now: EpochSeconds) -> Result<Reading, ParseError> {
    let payload: Value =
        serde_json::from_str(body).map_err(|error| ParseError::InvalidJson(error.to_string()))?;
    let entries = payload.as_array().ok_or(ParseError::InvalidPayloadType)?;
    let first = entries.first().ok_or(ParseError::EmptyResponse)?;
    let object = first.as_object().ok_or(ParseError::InvalidPayloadType)?;

    let last_reading_time = parse_sample_time(object)?;
    let direction = parse_trend(object)?;
    let bg = required(object, VALUE_KEY)?
        .as_i64()
        .ok_or(ParseError::InvalidField(VALUE_KEY))?;

    Ok(Reading {
        bg,
        trend: direction.code(),
        trend_english: direction,
        reading_lag: now.0 - last_reading_time.0,
        last_reading_time,
    })
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Value, ParseError> {
    object.get(key).ok_or(ParseError::MissingField(key))
}

// "/Date(1426292016000)/" or "Date(1426292016000-0700)", milliseconds since epoch.
fn parse_sample_time(object: &Map<String, Value>) -> Result<EpochSeconds, ParseError> {
    let raw = required(object, SAMPLE_TIME_KEY)?
        .as_str()
        .ok_or(ParseError::InvalidField(SAMPLE_TIME_KEY))?;

    let millis = first_digit_run(raw)
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or(ParseError::InvalidField(SAMPLE_TIME_KEY))?;

    Ok(EpochSeconds(millis / 1000))
}

fn parse_trend(object: &Map<String, Value>) -> Result<Direction, ParseError> {
    match required(object, TREND_KEY)? {
        Value::Number(number) => {
            let code = number.as_i64().ok_or(ParseError::InvalidField(TREND_KEY))?;
            Direction::from_code(code).ok_or(ParseError::UnknownTrend(code))
        }
        Value::String(label) => Direction::from_label(label)
            .ok_or_else(|| ParseError::UnknownTrendLabel(label.clone())),
        _ => Err(ParseError::InvalidField(TREND_KEY)),
    }
}

fn first_digit_run(text: &str) -> Option<&str> {
    let start = text.find(|char: char| char.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|char: char| !char.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}
