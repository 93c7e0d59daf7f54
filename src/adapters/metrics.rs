use thiserror::Error;

use crate::domain::session_state::EpochSeconds;

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub name: String,
    pub value: f64,
}

impl Gauge {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Destination for gauge values. `submit` blocks until the batch has been
/// handed to the backend.
pub trait MetricsSink {
    fn submit(&self, gauges: &[Gauge], timestamp: EpochSeconds) -> Result<(), MetricsError>;
}

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to resolve metrics endpoint: {0}")]
    Resolve(std::io::Error),
    #[error("udp metrics send failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("metrics http request failed: {0}")]
    Http(String),
    #[error("metrics backend rejected submission with status {0}")]
    Rejected(u16),
}
