//! Local circuit breaker guarding the background refresh loop.
//!
//! Tracks consecutive store failures. Once the threshold is hit the
//! circuit opens for `cooldown`; while open, refresh and recoverable reads
//! short-circuit to cache only. The refresh task's own retry delay backs
//! off exponentially between `initial_backoff` and `max_backoff` while
//! the circuit stays open.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_threshold: u32,
    cooldown: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl CircuitBreaker {
    pub fn new(
        failure_threshold: u32,
        cooldown: Duration,
        initial_backoff: Duration,
        max_backoff: Duration,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
            failure_threshold,
            cooldown,
            initial_backoff,
            max_backoff,
        }
    }

    /// Whether refresh/reads should currently short-circuit to cache only.
    ///
    /// The circuit auto-closes once `cooldown` has elapsed since it opened,
    /// allowing the next refresh attempt to run for real.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == State::Open {
            if let Some(opened_at) = inner.opened_at {
                if opened_at.elapsed() >= self.cooldown {
                    inner.state = State::Closed;
                    inner.consecutive_failures = 0;
                    inner.opened_at = None;
                    return false;
                }
            }
            return true;
        }
        false
    }

    /// Record a successful refresh/op. Resets the failure counter and
    /// closes the circuit if it was open.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.state = State::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    /// Record a failed refresh/op. Returns `true` if this call just opened
    /// the circuit.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.consecutive_failures += 1;
        if inner.state == State::Closed && inner.consecutive_failures >= self.failure_threshold {
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
            return true;
        }
        false
    }

    /// Backoff delay for the next refresh attempt, doubling per failure
    /// beyond the threshold and capped at `max_backoff`.
    pub fn next_backoff(&self) -> Duration {
        let failures = self.inner.lock().consecutive_failures;
        if failures <= self.failure_threshold {
            return self.initial_backoff;
        }
        let extra = failures - self.failure_threshold;
        let millis = self
            .initial_backoff
            .as_millis()
            .saturating_mul(1u128 << extra.min(16));
        Duration::from_millis(millis.min(self.max_backoff.as_millis()) as u64)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            3,
            Duration::from_millis(50),
            Duration::from_millis(10),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn starts_closed() {
        let cb = breaker();
        assert!(!cb.is_open());
    }

    #[test]
    fn opens_after_threshold() {
        let cb = breaker();
        assert!(!cb.record_failure());
        assert!(!cb.record_failure());
        assert!(cb.record_failure());
        assert!(cb.is_open());
    }

    #[test]
    fn success_resets_and_closes() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_open());
        cb.record_success();
        assert!(!cb.is_open());
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn auto_closes_after_cooldown() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_open());
        std::thread::sleep(Duration::from_millis(80));
        assert!(!cb.is_open());
    }

    #[test]
    fn backoff_grows_and_caps() {
        let cb = breaker();
        cb.record_failure();
        cb.record_failure();
        cb.record_failure(); // threshold hit, backoff == initial
        assert_eq!(cb.next_backoff(), Duration::from_millis(10));
        cb.record_failure(); // 1 past threshold -> doubled
        assert_eq!(cb.next_backoff(), Duration::from_millis(20));
        for _ in 0..10 {
            cb.record_failure();
        }
        assert_eq!(cb.next_backoff(), Duration::from_millis(100)); // capped
    }
}
