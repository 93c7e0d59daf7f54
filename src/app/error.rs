use thiserror::Error;

use crate::app::runtime::PollError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("runtime failure: {0}")]
    Runtime(String),
    #[error(transparent)]
    Poll(#[from] PollError),
}

impl AppError {
    pub fn logging_init<E: std::fmt::Display>(error: E) -> Self {
        Self::LoggingInit(error.to_string())
    }

    pub fn config<E: std::fmt::Display>(error: E) -> Self {
        Self::Config(error.to_string())
    }

    pub fn runtime<E: std::fmt::Display>(error: E) -> Self {
        Self::Runtime(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use crate::app::fetcher::FetchError;
    use crate::app::runtime::PollError;

    #[test]
    fn maps_logging_init_error_message() {
        let err = AppError::logging_init("subscriber already set");
        assert_eq!(
            err.to_string(),
            "failed to initialize logging: subscriber already set"
        );
    }

    #[test]
    fn poll_errors_keep_status_in_message() {
        let err = AppError::from(PollError::Fetch(FetchError {
            status: 500,
            body: "SessionNotValid".to_string(),
        }));

        assert_eq!(
            err.to_string(),
            "share fetch failed with status 500: SessionNotValid"
        );
    }
}
