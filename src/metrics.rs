use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a guard's admission counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardMetrics {
    pub total_requests: u64,
    pub admitted_requests: u64,
    pub rejected_requests: u64,
}

/// Counters updated on every admission decision.
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    admitted: AtomicU64,
    rejected: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record(&self, admitted: bool) {
        let counter = if admitted {
            &self.admitted
        } else {
            &self.rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> GuardMetrics {
        let admitted_requests = self.admitted.load(Ordering::Relaxed);
        let rejected_requests = self.rejected.load(Ordering::Relaxed);

        GuardMetrics {
            total_requests: admitted_requests + rejected_requests,
            admitted_requests,
            rejected_requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let collector = MetricsCollector::default();
        collector.record(true);
        collector.record(true);
        collector.record(false);

        assert_eq!(
            collector.snapshot(),
            GuardMetrics {
                total_requests: 3,
                admitted_requests: 2,
                rejected_requests: 1,
            }
        );
    }

    #[test]
    fn test_metrics_serialization() {
        let json = serde_json::to_value(GuardMetrics::default()).unwrap();
        assert_eq!(json["total_requests"], 0);
        assert_eq!(json["rejected_requests"], 0);
    }
}
