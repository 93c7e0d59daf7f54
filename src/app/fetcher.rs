use thiserror::Error;

use crate::adapters::share_http::{ShareClient, ShareClientError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("share fetch failed with status {status}: {body}")]
pub struct FetchError {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(String),
    Rejected(FetchError),
}

/// One latest-glucose request; retry decisions belong to the poller.
pub fn fetch_latest<C: ShareClient>(
    client: &C,
    session_id: &str,
    application_id: &str,
) -> Result<FetchOutcome, ShareClientError> {
    let response = client.latest_glucose(session_id, application_id)?;

    if response.status < 400 {
        Ok(FetchOutcome::Fetched(response.body))
    } else {
        Ok(FetchOutcome::Rejected(FetchError {
            status: response.status,
            body: response.body,
        }))
    }
}
