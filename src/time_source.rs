//! Wall-clock time source for the scheduler.
//!
//! The scheduler never reads the system clock or sleeps directly. It goes
//! through [`Clock`], so tests can drive a session with virtual time and the
//! real binary can wake early when a shutdown signal arrives.

use std::time::Duration;

use chrono::Utc;

use crate::signals::CancellationToken;

/// Source of the current UTC time and of timed waits.
pub trait Clock {
    /// Current UTC time as fractional seconds since the Unix epoch.
    fn now(&self) -> f64;

    /// Block for `duration` or until `cancel` fires, whichever comes first.
    ///
    /// Returns `true` if the wait ended because of cancellation.
    fn wait(&self, duration: Duration, cancel: &CancellationToken) -> bool;
}

/// The real clock: civil UTC time and a cancellable blocking wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
    }

    fn wait(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        cancel.wait_timeout(duration)
    }
}

#[cfg(any(test, feature = "testing-support"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "testing-support"))]
mod manual {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    use super::Clock;
    use crate::signals::CancellationToken;

    #[derive(Debug)]
    struct ManualState {
        now: f64,
        waits: usize,
        jumps: VecDeque<f64>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    /// Virtual clock that advances only when waited on.
    ///
    /// Clones share the same time, so a test can keep a handle while the
    /// scheduler owns another.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        state: Arc<Mutex<ManualState>>,
    }

    impl ManualClock {
        pub fn new(start: f64) -> Self {
            Self {
                state: Arc::new(Mutex::new(ManualState {
                    now: start,
                    waits: 0,
                    jumps: VecDeque::new(),
                    cancel_after: None,
                })),
            }
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Make the next wait advance time by `seconds` instead of the
        /// requested duration. Negative values step the clock backwards.
        pub fn push_jump(&self, seconds: f64) {
            self.lock().jumps.push_back(seconds);
        }

        /// Cancel `token` once `waits` waits have completed.
        pub fn cancel_after(&self, waits: usize, token: CancellationToken) {
            self.lock().cancel_after = Some((waits, token));
        }

        pub fn set(&self, now: f64) {
            self.lock().now = now;
        }

        pub fn waits(&self) -> usize {
            self.lock().waits
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> f64 {
            self.lock().now
        }

        fn wait(&self, duration: Duration, cancel: &CancellationToken) -> bool {
            let mut state = self.lock();
            let advance = state
                .jumps
                .pop_front()
                .unwrap_or_else(|| duration.as_secs_f64());
            state.now += advance;
            state.waits += 1;
            if let Some((limit, token)) = &state.cancel_after {
                if state.waits >= *limit {
                    token.cancel();
                }
            }
            cancel.is_cancelled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_recent() {
        // Any time after 2020-01-01 is plausible for a running system
        assert!(SystemClock.now() > 1_577_836_800.0);
    }

    #[test]
    fn test_system_clock_wait_returns_early_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        let started = std::time::Instant::now();
        assert!(SystemClock.wait(Duration::from_secs(30), &token));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_manual_clock_advances_on_wait() {
        let clock = ManualClock::new(1000.0);
        let token = CancellationToken::new();
        assert!(!clock.wait(Duration::from_secs(5), &token));
        assert_eq!(clock.now(), 1005.0);

        clock.push_jump(-10.0);
        clock.wait(Duration::from_secs(5), &token);
        assert_eq!(clock.now(), 995.0);
        assert_eq!(clock.waits(), 2);
    }

    #[test]
    fn test_manual_clock_cancel_after() {
        let clock = ManualClock::new(0.0);
        let token = CancellationToken::new();
        clock.cancel_after(2, token.clone());
        assert!(!clock.wait(Duration::from_secs(1), &token));
        assert!(clock.wait(Duration::from_secs(1), &token));
        assert!(token.is_cancelled());
    }
}
