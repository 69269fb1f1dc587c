use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use thiserror::Error;

use crate::response::ErrorResponse;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad category of a failure, for callers that are not speaking HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidConfiguration,
    ResourceExhausted,
}

/// Invalid guard settings. Raised at setup time, never per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("request limit must be greater than 0")]
    ZeroCapacity,
    #[error("window must be longer than 0 seconds")]
    ZeroWindow,
    #[error("{0}")]
    Invalid(String),
}

/// A call was turned away because the window is full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Too many requests. Limit is {limit} requests per {} seconds.", format_seconds(.window))]
pub struct RateLimitExceeded {
    pub limit: usize,
    pub window: Duration,
    /// Time until the oldest admission leaves the window.
    pub retry_after: Duration,
}

impl RateLimitExceeded {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    /// Whole seconds after which a retry will find a free slot. Never 0.
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.as_secs() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    RateLimitExceeded(#[from] RateLimitExceeded),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::InvalidConfiguration,
            Error::RateLimitExceeded(_) => ErrorKind::ResourceExhausted,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::RateLimitExceeded(err) => err.status_code(),
        }
    }
}

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(
            "rate_limit_exceeded",
            &self.to_string(),
            self.status_code().as_u16(),
        );
        let mut response = (self.status_code(), Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs()));
        response
    }
}

impl IntoResponse for ConfigurationError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = ErrorResponse::new("configuration_error", &self.to_string(), status.as_u16());
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Configuration(err) => err.into_response(),
            Error::RateLimitExceeded(err) => err.into_response(),
        }
    }
}

/// Render a window length the way operators write it: `10`, `0.5`.
pub(crate) fn format_seconds(window: &Duration) -> String {
    if window.subsec_nanos() == 0 {
        window.as_secs().to_string()
    } else {
        window.as_secs_f64().to_string()
    }
}
