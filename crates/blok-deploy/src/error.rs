//! Error types for the platform client and deployment polling.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single platform API call.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    /// The platform refused the request as invalid (400/422).
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Connect failure, timeout, or a 5xx/408/429 response.
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl PlatformError {
    /// True when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Network(_))
    }

    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PlatformError::Rejected {
                status: status.as_u16(),
                message,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Unauthorized(message),
            StatusCode::NOT_FOUND => PlatformError::NotFound(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
                PlatformError::Network(format!("{}: {}", status, message))
            }
            s if s.is_server_error() => PlatformError::Network(format!("{}: {}", status, message)),
            _ => PlatformError::Unexpected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            PlatformError::Network(err.to_string())
        } else if err.is_decode() {
            PlatformError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            PlatformError::from_status(status, err.to_string())
        } else {
            PlatformError::Unexpected {
                status: 0,
                message: err.to_string(),
            }
        }
    }
}

/// Errors from submitting a deployment or waiting for it.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The platform refused the schema at submission.
    #[error("deployment rejected: {0}")]
    Rejected(String),

    #[error("deployment job {job_id} failed: {message}")]
    Failed {
        job_id: String,
        message: String,
        log: Option<String>,
    },

    #[error("deployment job {job_id} did not finish within {}s", elapsed.as_secs())]
    TimedOut { job_id: String, elapsed: Duration },

    /// The local wait was cancelled; the remote job is unaffected.
    #[error("stopped waiting for deployment job {job_id}")]
    Cancelled { job_id: String },

    #[error("gave up polling after {attempts} consecutive network failures: {source}")]
    Network {
        attempts: u32,
        #[source]
        source: PlatformError,
    },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
