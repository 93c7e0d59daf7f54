use thiserror::Error;

use crate::adapters::share_http::{Credentials, ShareClient, ShareClientError};
use crate::app::config::PollerConfig;
use crate::domain::backoff::backoff_delay;
use crate::domain::session_state::Sleeper;

// The service answers some bad logins with 200 and an all-zero session id.
const NULL_SESSION_ID: &str = "00000000-0000-0000-0000-000000000000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("share login rejected with status {status} after {attempts} attempts: {body}")]
    Rejected {
        status: u16,
        body: String,
        attempts: u32,
    },
    #[error("share login failed: {0}")]
    Connection(#[from] ShareClientError),
}

/// Logs in, retrying rejected attempts with capped exponential backoff until
/// more than `max_auth_fails` consecutive rejections have been seen.
pub fn authenticate<C, S>(
    client: &C,
    sleeper: &S,
    credentials: &Credentials,
    config: &PollerConfig,
) -> Result<String, AuthError>
where
    C: ShareClient,
    S: Sleeper,
{
    let mut failures = 0_u32;

    loop {
        let response = client.login(credentials)?;

        if response.status == 200
            && let Some(token) = extract_token(&response.body)
        {
            tracing::debug!(attempts = failures + 1, "share session acquired");
            return Ok(token);
        }

        failures += 1;
        if failures > config.max_auth_fails {
            tracing::error!(
                status = response.status,
                body = %response.body,
                attempts = failures,
                "share login failure ceiling reached"
            );
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.body,
                attempts: failures,
            });
        }

        let delay = backoff_delay(failures, config.max_backoff);
        tracing::warn!(
            status = response.status,
            failures,
            delay_secs = delay.as_secs(),
            "share login failed, backing off"
        );
        sleeper.sleep(delay);
    }
}

fn extract_token(body: &str) -> Option<String> {
    let token = body.trim().trim_matches('"');
    if token.is_empty() || token == NULL_SESSION_ID {
        return None;
    }
    Some(token.to_string())
}
