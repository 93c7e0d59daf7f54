use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthcheckError {
    #[error("failed to build healthcheck client: {0}")]
    Build(String),
    #[error("healthcheck ping failed: {0}")]
    Connection(String),
    #[error("healthcheck endpoint answered with status {0}")]
    Status(u16),
}

pub trait HealthcheckPing {
    fn ping(&self) -> Result<(), HealthcheckError>;
}

#[derive(Debug, Clone)]
pub struct HealthcheckClient {
    client: Client,
    url: String,
}

impl HealthcheckClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, HealthcheckError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| HealthcheckError::Build(error.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl HealthcheckPing for HealthcheckClient {
    fn ping(&self) -> Result<(), HealthcheckError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|error| HealthcheckError::Connection(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthcheckError::Status(status.as_u16()));
        }

        Ok(())
    }
}
