use std::time::Duration;

use crate::adapters::datadog::DEFAULT_SITE_URL;
use crate::adapters::share_http::{Credentials, DEFAULT_APPLICATION_ID, DEFAULT_BASE_URL};
use crate::app::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsTarget {
    Statsd { address: String },
    DatadogHttp { site_url: String, api_key: String },
}

/// Limits and delays of the polling state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub check_interval: Duration,
    pub max_auth_fails: u32,
    pub max_fetch_fails: u32,
    pub retry_delay: Duration,
    pub max_backoff: Duration,
    pub max_reading_lag: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(150),
            max_auth_fails: 5,
            max_fetch_fails: 10,
            retry_delay: Duration::from_secs(60),
            max_backoff: Duration::from_secs(300),
            max_reading_lag: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub share_base_url: String,
    pub request_timeout: Duration,
    pub poller: PollerConfig,
    pub stat_name: String,
    pub metrics: MetricsTarget,
    pub healthcheck_url: Option<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account_name = required(&lookup, "DEXCOM_ACCOUNT_NAME")?;
        let password = lookup("DEXCOM_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::config("DEXCOM_PASSWORD is required"))?;

        let defaults = PollerConfig::default();
        let poller = PollerConfig {
            check_interval: seconds_or_default(
                &lookup,
                "CHECK_INTERVAL_SECS",
                defaults.check_interval,
            )?,
            max_auth_fails: parse_or_default(&lookup, "MAX_AUTH_FAILS", defaults.max_auth_fails)?,
            max_fetch_fails: parse_or_default(
                &lookup,
                "MAX_FETCH_FAILS",
                defaults.max_fetch_fails,
            )?,
            retry_delay: seconds_or_default(&lookup, "RETRY_DELAY_SECS", defaults.retry_delay)?,
            max_backoff: seconds_or_default(&lookup, "MAX_BACKOFF_SECS", defaults.max_backoff)?,
            max_reading_lag: seconds_or_default(
                &lookup,
                "MAX_READING_LAG_SECS",
                defaults.max_reading_lag,
            )?,
        };

        let metrics = match optional(&lookup, "DD_API_KEY") {
            Some(api_key) => MetricsTarget::DatadogHttp {
                site_url: optional(&lookup, "DD_SITE_URL")
                    .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
                api_key,
            },
            None => MetricsTarget::Statsd {
                address: optional(&lookup, "STATSD_ADDR")
                    .unwrap_or_else(|| "127.0.0.1:8125".to_string()),
            },
        };

        let log_format = match optional(&lookup, "LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(AppError::config(format!(
                    "LOG_FORMAT must be text or json, got {other}"
                )));
            }
        };

        Ok(Self {
            credentials: Credentials {
                account_name,
                password,
                application_id: optional(&lookup, "DEXCOM_APPLICATION_ID")
                    .unwrap_or_else(|| DEFAULT_APPLICATION_ID.to_string()),
            },
            share_base_url: optional(&lookup, "DEXCOM_SHARE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: seconds_or_default(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                Duration::from_secs(30),
            )?,
            poller,
            stat_name: optional(&lookup, "STAT_NAME").unwrap_or_else(|| "dexcom.bg".to_string()),
            metrics,
            healthcheck_url: optional(&lookup, "HEALTHCHECK_URL"),
            log_format,
        })
    }

    /// Backend name for logs; keeps the API key out of them.
    pub fn metrics_backend(&self) -> &'static str {
        match self.metrics {
            MetricsTarget::Statsd { .. } => "statsd",
            MetricsTarget::DatadogHttp { .. } => "datadog-http",
        }
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| AppError::config(format!("{key} is required")))
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}

fn seconds_or_default<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or_default(lookup, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AppConfig, LogFormat, MetricsTarget, PollerConfig};

    fn base_lookup(key: &str) -> Option<String> {
        match key {
            "DEXCOM_ACCOUNT_NAME" => Some("alice".to_string()),
            "DEXCOM_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        }
    }

    #[test]
    fn rejects_missing_account_name() {
        let result = AppConfig::from_lookup(|_| None);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: DEXCOM_ACCOUNT_NAME is required"
        );
    }

    #[test]
    fn rejects_missing_password() {
        let result = AppConfig::from_lookup(|key| match key {
            "DEXCOM_ACCOUNT_NAME" => Some("alice".to_string()),
            _ => None,
        });

        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: DEXCOM_PASSWORD is required"
        );
    }

    #[test]
    fn applies_defaults_for_optional_fields() {
        let result = AppConfig::from_lookup(base_lookup).expect("config should be valid");

        assert_eq!(result.credentials.account_name, "alice");
        assert_eq!(
            result.credentials.application_id,
            "d89443d2-327c-4a6f-89e5-496bbb0317db"
        );
        assert_eq!(
            result.share_base_url,
            "https://share1.dexcom.com/ShareWebServices/Services"
        );
        assert_eq!(result.request_timeout, Duration::from_secs(30));
        assert_eq!(result.poller, PollerConfig::default());
        assert_eq!(result.poller.check_interval, Duration::from_secs(150));
        assert_eq!(result.poller.max_fetch_fails, 10);
        assert_eq!(result.stat_name, "dexcom.bg");
        assert_eq!(
            result.metrics,
            MetricsTarget::Statsd {
                address: "127.0.0.1:8125".to_string()
            }
        );
        assert_eq!(result.healthcheck_url, None);
        assert_eq!(result.log_format, LogFormat::Text);
    }

    #[test]
    fn api_key_selects_datadog_http_sink() {
        let result = AppConfig::from_lookup(|key| match key {
            "DD_API_KEY" => Some("key-1".to_string()),
            "HEALTHCHECK_URL" => Some(" https://hc-ping.com/abc ".to_string()),
            "LOG_FORMAT" => Some("json".to_string()),
            other => base_lookup(other),
        })
        .expect("config should be valid");

        assert_eq!(
            result.metrics,
            MetricsTarget::DatadogHttp {
                site_url: "https://api.datadoghq.com".to_string(),
                api_key: "key-1".to_string(),
            }
        );
        assert_eq!(
            result.healthcheck_url.as_deref(),
            Some("https://hc-ping.com/abc")
        );
        assert_eq!(result.log_format, LogFormat::Json);
        assert_eq!(result.metrics_backend(), "datadog-http");
    }

    #[test]
    fn rejects_invalid_numeric_values() {
        let result = AppConfig::from_lookup(|key| match key {
            "MAX_FETCH_FAILS" => Some("ten".to_string()),
            other => base_lookup(other),
        });

        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: MAX_FETCH_FAILS must be a valid number"
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result = AppConfig::from_lookup(|key| match key {
            "LOG_FORMAT" => Some("xml".to_string()),
            other => base_lookup(other),
        });

        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid configuration: LOG_FORMAT must be text or json, got xml"
        );
    }

    #[test]
    fn log_format_is_trimmed_before_matching() {
        let result = AppConfig::from_lookup(|key| match key {
            "LOG_FORMAT" => Some(" json ".to_string()),
            other => base_lookup(other),
        })
        .expect("config should be valid");

        assert_eq!(result.log_format, LogFormat::Json);
    }

    #[test]
    fn reads_values_from_dotenv_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "DEXCOM_ACCOUNT_NAME=bob\nDEXCOM_PASSWORD=secret\nCHECK_INTERVAL_SECS=300\n",
        )
        .expect("env file should be written");

        let values: Vec<(String, String)> = dotenvy::from_path_iter(&path)
            .expect("env file should open")
            .collect::<Result<_, _>>()
            .expect("env file should parse");
        let result = AppConfig::from_lookup(|key| {
            values
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        })
        .expect("config should be valid");

        assert_eq!(result.credentials.account_name, "bob");
        assert_eq!(result.poller.check_interval, Duration::from_secs(300));
    }
}
