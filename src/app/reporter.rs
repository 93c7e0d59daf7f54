use crate::adapters::healthcheck::HealthcheckPing;
use crate::adapters::metrics::{Gauge, MetricsSink};
use crate::domain::reading::Reading;
use crate::domain::session_state::EpochSeconds;

pub trait ReadingReporter {
    /// Best-effort: failures are logged, never returned.
    fn report(&self, reading: &Reading);
}

pub struct MetricsReporter {
    sink: Box<dyn MetricsSink>,
    healthcheck: Option<Box<dyn HealthcheckPing>>,
    stat_name: String,
}

impl MetricsReporter {
    pub fn new(
        sink: Box<dyn MetricsSink>,
        healthcheck: Option<Box<dyn HealthcheckPing>>,
        stat_name: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            healthcheck,
            stat_name: stat_name.into(),
        }
    }

    fn gauges(&self, reading: &Reading) -> [Gauge; 2] {
        [
            Gauge::new(self.stat_name.clone(), reading.bg as f64),
            Gauge::new(format!("{}.lag", self.stat_name), reading.reading_lag as f64),
        ]
    }
}

impl ReadingReporter for MetricsReporter {
    fn report(&self, reading: &Reading) {
        let processed_at = EpochSeconds(reading.last_reading_time.0 + reading.reading_lag);

        if let Err(error) = self.sink.submit(&self.gauges(reading), processed_at) {
            tracing::error!(
                error = %error,
                bg = reading.bg,
                "failed to send reading to metrics backend"
            );
            return;
        }
        tracing::debug!(bg = reading.bg, stat = %self.stat_name, "sent reading to metrics backend");

        // The healthcheck vouches for delivered readings only.
        if let Some(healthcheck) = &self.healthcheck {
            match healthcheck.ping() {
                Ok(()) => tracing::debug!("sent healthcheck"),
                Err(error) => tracing::error!(error = %error, "error sending healthcheck"),
            }
        }
    }
}
