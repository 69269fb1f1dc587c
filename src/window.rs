//! Sliding window log
//!
//! Keeps the admission times that are still inside the trailing window,
//! oldest first. Expired entries are only dropped when a new admission is
//! attempted; there is no background eviction.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Outcome of a single admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted {
        /// Slots left in the window after this admission.
        remaining: usize,
    },
    Rejected {
        /// Time until the oldest entry reaches the edge of the window.
        retry_after: Duration,
    },
}

#[derive(Debug)]
pub struct SlidingWindow {
    capacity: NonZeroUsize,
    window: Duration,
    timestamps: VecDeque<Duration>,
}

impl SlidingWindow {
    pub fn new(capacity: NonZeroUsize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            timestamps: VecDeque::with_capacity(capacity.get()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Entries held as of the last purge.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent recorded admission.
    pub fn latest(&self) -> Option<Duration> {
        self.timestamps.back().copied()
    }

    /// Drop every entry older than the window. Returns how many were removed.
    ///
    /// Entries are sorted, so this stops at the first one still in range. An
    /// entry exactly `window` old is kept.
    pub fn purge(&mut self, now: Duration) -> usize {
        let mut purged = 0;
        while self
            .timestamps
            .front()
            .is_some_and(|oldest| now.saturating_sub(*oldest) > self.window)
        {
            self.timestamps.pop_front();
            purged += 1;
        }
        purged
    }

    /// Purge, check capacity and record `now` in one step.
    ///
    /// If `now` is earlier than the newest entry the newest value is recorded
    /// again, which keeps the log sorted.
    pub fn try_admit(&mut self, now: Duration) -> Decision {
        self.purge(now);

        if self.timestamps.len() >= self.capacity.get() {
            return Decision::Rejected {
                retry_after: self.retry_after(now),
            };
        }

        let stamp = self.latest().map_or(now, |latest| latest.max(now));
        self.timestamps.push_back(stamp);

        Decision::Admitted {
            remaining: self.capacity.get() - self.timestamps.len(),
        }
    }

    fn retry_after(&self, now: Duration) -> Duration {
        self.timestamps
            .front()
            .map(|oldest| (*oldest + self.window).saturating_sub(now))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(capacity: usize, secs: f64) -> SlidingWindow {
        SlidingWindow::new(
            NonZeroUsize::new(capacity).unwrap(),
            Duration::from_secs_f64(secs),
        )
    }

    fn at(secs: f64) -> Duration {
        Duration::from_secs_f64(secs)
    }

    fn admitted(decision: Decision) -> bool {
        matches!(decision, Decision::Admitted { .. })
    }

    #[test]
    fn test_admits_up_to_capacity_within_one_window() {
        let mut log = window(3, 60.0);
        let decisions: Vec<bool> = (0..10).map(|i| admitted(log.try_admit(at(i as f64)))).collect();

        assert_eq!(decisions.iter().filter(|d| **d).count(), 3);
        assert_eq!(&decisions[..3], &[true, true, true]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_window_expiry() {
        let mut log = window(1, 5.0);
        assert!(admitted(log.try_admit(at(0.0))));
        assert!(!admitted(log.try_admit(at(4.9))));
        assert!(admitted(log.try_admit(at(5.1))));
    }

    #[test]
    fn test_recovery_after_purge() {
        let mut log = window(2, 10.0);
        assert!(admitted(log.try_admit(at(0.0))));
        assert!(admitted(log.try_admit(at(0.0))));
        assert!(!admitted(log.try_admit(at(1.0))));
        assert!(admitted(log.try_admit(at(11.0))));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_entry_exactly_window_old_is_kept() {
        let mut log = window(1, 5.0);
        assert!(admitted(log.try_admit(at(0.0))));
        assert!(!admitted(log.try_admit(at(5.0))));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_rejection_does_not_record() {
        let mut log = window(1, 5.0);
        log.try_admit(at(0.0));
        for i in 1..5 {
            assert!(!admitted(log.try_admit(at(i as f64))));
        }
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest(), Some(at(0.0)));
    }

    #[test]
    fn test_purge_only_trims_expired_prefix() {
        let mut log = window(5, 10.0);
        for t in [0.0, 1.0, 2.0, 8.0, 9.0] {
            log.try_admit(at(t));
        }

        assert_eq!(log.purge(at(11.5)), 2);
        assert_eq!(log.len(), 3);
        assert_eq!(log.purge(at(11.5)), 0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut log = window(3, 1.0);
        assert_eq!(log.try_admit(at(0.0)), Decision::Admitted { remaining: 2 });
        assert_eq!(log.try_admit(at(0.1)), Decision::Admitted { remaining: 1 });
        assert_eq!(log.try_admit(at(0.2)), Decision::Admitted { remaining: 0 });
    }

    #[test]
    fn test_retry_after_tracks_oldest_entry() {
        let mut log = window(2, 10.0);
        log.try_admit(at(0.0));
        log.try_admit(at(3.0));

        assert_eq!(
            log.try_admit(at(4.0)),
            Decision::Rejected { retry_after: at(6.0) }
        );
    }

    #[test]
    fn test_backward_clock_keeps_log_sorted() {
        let mut log = window(3, 10.0);
        log.try_admit(at(100.0));
        log.try_admit(at(40.0));

        assert_eq!(log.latest(), Some(at(100.0)));
        assert!(admitted(log.try_admit(at(50.0))));
        assert!(!admitted(log.try_admit(at(60.0))));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut log = window(4, 2.0);
        for step in 0..200 {
            log.try_admit(at(step as f64 * 0.13));
            assert!(log.len() <= log.capacity());
        }
    }
}
