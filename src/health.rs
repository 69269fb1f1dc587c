use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::clock::Clock;
use crate::error::format_seconds;
use crate::guard::AdmissionGuard;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub guard: GuardStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GuardStatus {
    pub limit: usize,
    pub window_seconds: String,
    /// Entries held as of the last admission attempt
    pub recorded: usize,
    /// "open" while slots may be free, "saturated" when the last known count is at the limit
    pub state: String,
}

static START_TIME: std::sync::LazyLock<SystemTime> = std::sync::LazyLock::new(SystemTime::now);

pub struct HealthChecker<C> {
    guard: AdmissionGuard<C>,
}

impl<C: Clock> HealthChecker<C> {
    pub fn new(guard: AdmissionGuard<C>) -> Self {
        // Touch the start time so uptime counts from server setup.
        let _ = *START_TIME;
        Self { guard }
    }

    pub fn check_health(&self) -> HealthStatus {
        let now = SystemTime::now();
        let uptime = now.duration_since(*START_TIME).unwrap_or_default().as_secs();

        HealthStatus {
            status: "healthy".to_string(),
            timestamp: now
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            guard: self.guard_status(),
        }
    }

    fn guard_status(&self) -> GuardStatus {
        let recorded = self.guard.recorded();
        let state = if recorded >= self.guard.limit() {
            "saturated"
        } else {
            "open"
        };

        GuardStatus {
            limit: self.guard.limit(),
            window_seconds: format_seconds(&self.guard.window()),
            recorded,
            state: state.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn test_health_reports_guard_state() {
        let guard =
            AdmissionGuard::with_clock(2, Duration::from_secs(10), ManualClock::new()).unwrap();
        let checker = HealthChecker::new(guard.clone());

        let status = checker.check_health();
        assert_eq!(status.status, "healthy");
        assert_eq!(status.guard.limit, 2);
        assert_eq!(status.guard.window_seconds, "10");
        assert_eq!(status.guard.state, "open");

        guard.try_acquire().unwrap();
        guard.try_acquire().unwrap();
        let status = checker.check_health();
        assert_eq!(status.guard.recorded, 2);
        assert_eq!(status.guard.state, "saturated");
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            timestamp: 1234567890,
            version: "1.0.0".to_string(),
            uptime_seconds: 3600,
            guard: GuardStatus {
                limit: 5,
                window_seconds: "10".to_string(),
                recorded: 0,
                state: "open".to_string(),
            },
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("1234567890"));
    }
}
