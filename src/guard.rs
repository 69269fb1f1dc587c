//! Sliding-window admission guard
//!
//! One guard protects one operation. Every invocation purges expired
//! timestamps, checks the remaining capacity and records itself, all under a
//! single lock, before the wrapped operation is allowed to run.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::error::{ConfigurationError, RateLimitExceeded};
use crate::metrics::{GuardMetrics, MetricsCollector};
use crate::window::{Decision, SlidingWindow};

/// A granted slot in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub limit: usize,
    pub remaining: usize,
}

struct Shared<C> {
    window: Mutex<SlidingWindow>,
    metrics: MetricsCollector,
    clock: C,
}

/// Rate limiter for a single guarded operation.
///
/// Cloning hands out another reference to the same guard; the clones share
/// one window and one budget. Two guards built separately are independent.
pub struct AdmissionGuard<C = MonotonicClock> {
    shared: Arc<Shared<C>>,
    limit: usize,
    window: Duration,
}

impl AdmissionGuard<MonotonicClock> {
    /// Allow at most `requests` admissions in any trailing `window`.
    pub fn new(requests: usize, window: Duration) -> Result<Self, ConfigurationError> {
        Self::with_clock(requests, window, MonotonicClock::new())
    }

    /// Convenience for whole-second windows.
    pub fn per_seconds(requests: usize, window_seconds: u64) -> Result<Self, ConfigurationError> {
        Self::new(requests, Duration::from_secs(window_seconds))
    }
}

impl<C: Clock> AdmissionGuard<C> {
    pub fn with_clock(requests: usize, window: Duration, clock: C) -> Result<Self, ConfigurationError> {
        let capacity = NonZeroUsize::new(requests).ok_or(ConfigurationError::ZeroCapacity)?;
        if window.is_zero() {
            return Err(ConfigurationError::ZeroWindow);
        }

        Ok(Self {
            shared: Arc::new(Shared {
                window: Mutex::new(SlidingWindow::new(capacity, window)),
                metrics: MetricsCollector::default(),
                clock,
            }),
            limit: requests,
            window,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Entries held as of the last admission attempt. Does not purge.
    pub fn recorded(&self) -> usize {
        self.lock().len()
    }

    pub fn metrics(&self) -> GuardMetrics {
        self.shared.metrics.snapshot()
    }

    /// Purge, check and record in one atomic step.
    ///
    /// On success the slot is already counted against the window, whether or
    /// not the caller goes on to run anything.
    pub fn try_acquire(&self) -> Result<Admission, RateLimitExceeded> {
        let decision = {
            let mut window = self.lock();
            let now = self.shared.clock.now();
            if window.latest().is_some_and(|latest| now < latest) {
                warn!(
                    target: "slowdown::guard",
                    "clock moved backward, recording admission at the latest known time"
                );
            }
            window.try_admit(now)
        };

        match decision {
            Decision::Admitted { remaining } => {
                self.shared.metrics.record(true);
                debug!(
                    target: "slowdown::guard",
                    limit = self.limit,
                    remaining,
                    "request admitted"
                );
                Ok(Admission {
                    limit: self.limit,
                    remaining,
                })
            }
            Decision::Rejected { retry_after } => {
                self.shared.metrics.record(false);
                debug!(
                    target: "slowdown::guard",
                    limit = self.limit,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "request rejected"
                );
                Err(RateLimitExceeded {
                    limit: self.limit,
                    window: self.window,
                    retry_after,
                })
            }
        }
    }

    /// Run `op` if a slot is free.
    ///
    /// Whatever `op` returns is handed back untouched. For async work, return
    /// the future from `op` and await the result:
    ///
    /// ```no_run
    /// # async fn fetch() -> u32 { 7 }
    /// # async fn demo() -> Result<(), slowdown::RateLimitExceeded> {
    /// let guard = slowdown::AdmissionGuard::per_seconds(10, 60).unwrap();
    /// let value = guard.call(|| fetch())?.await;
    /// # Ok(())
    /// # }
    /// ```
    pub fn call<F, R>(&self, op: F) -> Result<R, RateLimitExceeded>
    where
        F: FnOnce() -> R,
    {
        self.try_acquire()?;
        Ok(op())
    }

    /// Wrap `op` so every invocation goes through this guard.
    ///
    /// Multiple arguments can be passed as a tuple.
    pub fn wrap<A, R, F>(&self, op: F) -> impl Fn(A) -> Result<R, RateLimitExceeded>
    where
        F: Fn(A) -> R,
    {
        let guard = self.clone();
        move |args| guard.call(|| op(args))
    }

    fn lock(&self) -> MutexGuard<'_, SlidingWindow> {
        // The critical section never runs caller code, so a poisoned lock
        // still holds a consistent window.
        self.shared
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Clone for AdmissionGuard<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            limit: self.limit,
            window: self.window,
        }
    }
}

impl<C> fmt::Debug for AdmissionGuard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGuard")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
