use envconfig::Envconfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::ConfigurationError;
use crate::guard::AdmissionGuard;

/// Settings for one guarded endpoint.
///
/// Deserializes from documents such as `{"requests": 5, "window": "10s"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuardConfig {
    /// Maximum admissions in any trailing window
    #[validate(range(min = 1, message = "request limit must be greater than 0"))]
    pub requests: usize,

    /// Length of the sliding window
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = "validate_window"))]
    pub window: Duration,
}

fn validate_window(window: &Duration) -> Result<(), ValidationError> {
    if window.is_zero() {
        let mut err = ValidationError::new("zero_window");
        err.message = Some("window must be longer than 0 seconds".into());
        return Err(err);
    }
    Ok(())
}

impl GuardConfig {
    pub fn new(requests: usize, window: Duration) -> Self {
        Self { requests, window }
    }

    /// Validate and build a guard with the default monotonic clock.
    pub fn build(&self) -> Result<AdmissionGuard, ConfigurationError> {
        self.validate()
            .map_err(|e| ConfigurationError::Invalid(e.to_string()))?;
        AdmissionGuard::new(self.requests, self.window)
    }
}

/// Settings for the demonstration server, read from the environment.
#[derive(Debug, Envconfig, Clone)]
pub struct Config {
    /// Server bind address
    #[envconfig(from = "SLOWDOWN_BIND_ADDR", default = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Requests admitted per window on the guarded route
    #[envconfig(from = "SLOWDOWN_REQUESTS", default = "5")]
    pub requests: usize,

    /// Window length in seconds
    #[envconfig(from = "SLOWDOWN_WINDOW_SECONDS", default = "10")]
    pub window_seconds: u64,

    #[envconfig(from = "SLOWDOWN_LOG_LEVEL", default = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Config::init_from_env()
    }

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig::new(self.requests, Duration::from_secs(self.window_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_guard_config_from_json() {
        let config: GuardConfig =
            serde_json::from_str(r#"{"requests": 5, "window": "1m 30s"}"#).unwrap();
        assert_eq!(config, GuardConfig::new(5, Duration::from_secs(90)));

        let guard = config.build().unwrap();
        assert_eq!(guard.limit(), 5);
        assert_eq!(guard.window(), Duration::from_secs(90));
    }

    #[test]
    fn test_guard_config_rejects_zero_requests() {
        let err = GuardConfig::new(0, Duration::from_secs(10)).build().unwrap_err();
        match err {
            ConfigurationError::Invalid(msg) => {
                assert!(msg.contains("request limit must be greater than 0"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_guard_config_rejects_zero_window() {
        let config: GuardConfig = serde_json::from_str(r#"{"requests": 5, "window": "0s"}"#).unwrap();
        assert!(config.validate().is_err());
        assert!(config.build().is_err());
    }

    #[test]
    fn test_guard_config_serializes_humantime() {
        let json = serde_json::to_value(GuardConfig::new(3, Duration::from_secs(10))).unwrap();
        assert_eq!(json["window"], "10s");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = Config::init_from_hashmap(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.requests, 5);
        assert_eq!(config.window_seconds, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_server_config_overrides() {
        let vars = HashMap::from([
            ("SLOWDOWN_REQUESTS".to_string(), "20".to_string()),
            ("SLOWDOWN_WINDOW_SECONDS".to_string(), "60".to_string()),
        ]);
        let config = Config::init_from_hashmap(&vars).unwrap();
        assert_eq!(
            config.guard_config(),
            GuardConfig::new(20, Duration::from_secs(60))
        );
    }

    #[test]
    fn test_server_config_rejects_garbage() {
        let vars = HashMap::from([("SLOWDOWN_REQUESTS".to_string(), "many".to_string())]);
        assert!(Config::init_from_hashmap(&vars).is_err());
    }
}
