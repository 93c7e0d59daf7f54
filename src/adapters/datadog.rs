use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;

use crate::adapters::metrics::{Gauge, MetricsError, MetricsSink};
use crate::domain::session_state::EpochSeconds;

pub const DEFAULT_SITE_URL: &str = "https://api.datadoghq.com";
const SERIES_PATH: &str = "/api/v1/series";
const API_KEY_HEADER: &str = "DD-API-KEY";

#[derive(Serialize)]
struct SeriesPayload<'a> {
    series: Vec<Series<'a>>,
}

#[derive(Serialize)]
struct Series<'a> {
    metric: &'a str,
    points: [(i64, f64); 1],
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Pushes gauges straight to the Datadog series API.
#[derive(Debug, Clone)]
pub struct DatadogHttpSink {
    client: Client,
    series_url: String,
    api_key: String,
}

impl DatadogHttpSink {
    pub fn new(site_url: &str, api_key: &str, timeout: Duration) -> Result<Self, MetricsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| MetricsError::Http(error.to_string()))?;

        Ok(Self {
            client,
            series_url: format!("{}{SERIES_PATH}", site_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

impl MetricsSink for DatadogHttpSink {
    fn submit(&self, gauges: &[Gauge], timestamp: EpochSeconds) -> Result<(), MetricsError> {
        let payload = SeriesPayload {
            series: gauges
                .iter()
                .map(|gauge| Series {
                    metric: &gauge.name,
                    points: [(timestamp.0, gauge.value)],
                    kind: "gauge",
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.series_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .map_err(|error| MetricsError::Http(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::DatadogHttpSink;
    use crate::adapters::metrics::{Gauge, MetricsError, MetricsSink};
    use crate::domain::session_state::EpochSeconds;

    #[test]
    fn posts_series_with_api_key() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v1/series")
            .match_header("dd-api-key", "secret-key")
            .match_body(Matcher::Json(json!({
                "series": [
                    {"metric": "dexcom.bg", "points": [[1_000_000_000, 120.0]], "type": "gauge"},
                    {"metric": "dexcom.bg.lag", "points": [[1_000_000_000, 60.0]], "type": "gauge"}
                ]
            })))
            .with_status(202)
            .with_body(r#"{"status":"ok"}"#)
            .create();

        let sink = DatadogHttpSink::new(&server.url(), "secret-key", Duration::from_secs(5))
            .expect("sink should build");

        sink.submit(
            &[Gauge::new("dexcom.bg", 120.0), Gauge::new("dexcom.bg.lag", 60.0)],
            EpochSeconds(1_000_000_000),
        )
        .expect("submit should succeed");

        mock.assert();
    }

    #[test]
    fn surfaces_rejected_submissions() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/v1/series")
            .with_status(403)
            .with_body(r#"{"errors":["Forbidden"]}"#)
            .create();

        let sink = DatadogHttpSink::new(&server.url(), "bad-key", Duration::from_secs(5))
            .expect("sink should build");

        let result = sink.submit(&[Gauge::new("dexcom.bg", 120.0)], EpochSeconds(1));

        assert!(matches!(result, Err(MetricsError::Rejected(403))));
        mock.assert();
    }
}
