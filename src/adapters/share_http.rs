use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_APPLICATION_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";
pub const DEFAULT_BASE_URL: &str = "https://share1.dexcom.com/ShareWebServices/Services";
pub const SHARE_USER_AGENT: &str = "Dexcom Share/3.0.2.11 CFNetwork/711.2.23 Darwin/14.0.0";

const LOGIN_PATH: &str = "/General/LoginPublisherAccountByName";
const LATEST_GLUCOSE_PATH: &str = "/Publisher/ReadPublisherLatestGlucoseValues";
const JSON_CONTENT_TYPE: &str = "application/json";

pub const LOOKBACK_MINUTES: u32 = 1440;
pub const MAX_COUNT: u32 = 1;

#[derive(Clone)]
pub struct Credentials {
    pub account_name: String,
    pub password: String,
    pub application_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("password", &"<redacted>")
            .field("application_id", &self.application_id)
            .finish()
    }
}

/// Status and raw body of a Share response, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareResponse {
    pub status: u16,
    pub body: String,
}

pub trait ShareClient {
    fn login(&self, credentials: &Credentials) -> Result<ShareResponse, ShareClientError>;
    fn latest_glucose(
        &self,
        session_id: &str,
        application_id: &str,
    ) -> Result<ShareResponse, ShareClientError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareClientError {
    #[error("failed to build share http client: {0}")]
    Build(String),
    #[error("share service unreachable: {0}")]
    Connection(String),
    #[error("failed to read share response body: {0}")]
    Body(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    account_name: &'a str,
    password: &'a str,
    application_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LatestGlucoseRequest<'a> {
    application_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct ShareHttpClient {
    client: Client,
    base_url: String,
}

impl ShareHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ShareClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(SHARE_USER_AGENT)
            .build()
            .map_err(|error| ShareClientError::Build(error.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn into_share_response(
        response: reqwest::blocking::Response,
    ) -> Result<ShareResponse, ShareClientError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| ShareClientError::Body(error.to_string()))?;
        Ok(ShareResponse { status, body })
    }
}

impl ShareClient for ShareHttpClient {
    fn login(&self, credentials: &Credentials) -> Result<ShareResponse, ShareClientError> {
        let request = LoginRequest {
            account_name: &credentials.account_name,
            password: &credentials.password,
            application_id: &credentials.application_id,
        };

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .json(&request)
            .send()
            .map_err(|error| ShareClientError::Connection(error.to_string()))?;

        Self::into_share_response(response)
    }

    fn latest_glucose(
        &self,
        session_id: &str,
        application_id: &str,
    ) -> Result<ShareResponse, ShareClientError> {
        let minutes = LOOKBACK_MINUTES.to_string();
        let max_count = MAX_COUNT.to_string();

        let response = self
            .client
            .post(self.url(LATEST_GLUCOSE_PATH))
            .query(&[
                ("sessionID", session_id),
                ("minutes", minutes.as_str()),
                ("maxCount", max_count.as_str()),
            ])
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(ACCEPT, JSON_CONTENT_TYPE)
            .json(&LatestGlucoseRequest { application_id })
            .send()
            .map_err(|error| ShareClientError::Connection(error.to_string()))?;

        Self::into_share_response(response)
    }
}
