//! Per-model circuit breaker

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Externally visible breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed { consecutive_failures: u32 },
    Open { opened_at: Instant },
    /// One probe call is allowed through at a time
    HalfOpen { probing: bool },
}

/// Opens after `failure_threshold` consecutive failures and lets a single
/// probe through once `cooldown` has elapsed. A successful probe closes the
/// circuit, a failed one re-opens it.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    state: Mutex<BreakerState>,
}

/// What a recorded failure did to the circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    StillClosed,
    Opened,
    Reopened,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            state: Mutex::new(BreakerState::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            BreakerState::Closed { .. } => CircuitState::Closed,
            BreakerState::Open { opened_at } if opened_at.elapsed() >= self.cooldown => {
                CircuitState::HalfOpen
            }
            BreakerState::Open { .. } => CircuitState::Open,
            BreakerState::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Whether a call would currently be let through
    pub fn is_available(&self) -> bool {
        match *self.lock() {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { opened_at } => opened_at.elapsed() >= self.cooldown,
            BreakerState::HalfOpen { probing } => !probing,
        }
    }

    /// Claim permission for one call, moving an expired open circuit to half-open
    ///
    /// A half-open probe is handed back when the permit is dropped without
    /// recording an outcome.
    pub fn try_acquire(&self) -> Option<CircuitPermit<'_>> {
        let mut state = self.lock();

        let probe = match *state {
            BreakerState::Closed { .. } => false,
            BreakerState::Open { opened_at } if opened_at.elapsed() >= self.cooldown => {
                *state = BreakerState::HalfOpen { probing: true };
                true
            }
            BreakerState::Open { .. } => return None,
            BreakerState::HalfOpen { probing: false } => {
                *state = BreakerState::HalfOpen { probing: true };
                true
            }
            BreakerState::HalfOpen { probing: true } => return None,
        };

        Some(CircuitPermit {
            breaker: self,
            probe,
            settled: false,
        })
    }

    /// Returns true when this success closed a previously open circuit
    pub fn record_success(&self) -> bool {
        let mut state = self.lock();
        let was_tripped = !matches!(*state, BreakerState::Closed { .. });

        *state = BreakerState::Closed {
            consecutive_failures: 0,
        };

        was_tripped
    }

    pub fn record_failure(&self) -> FailureOutcome {
        let mut state = self.lock();

        match *state {
            BreakerState::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.failure_threshold {
                    *state = BreakerState::Open {
                        opened_at: Instant::now(),
                    };
                    FailureOutcome::Opened
                } else {
                    *state = BreakerState::Closed {
                        consecutive_failures: failures,
                    };
                    FailureOutcome::StillClosed
                }
            }
            BreakerState::HalfOpen { .. } | BreakerState::Open { .. } => {
                *state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
                FailureOutcome::Reopened
            }
        }
    }

    fn release(&self) {
        let mut state = self.lock();

        if let BreakerState::HalfOpen { probing: true } = *state {
            *state = BreakerState::HalfOpen { probing: false };
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Permission for one call through a [`CircuitBreaker`]
#[derive(Debug)]
#[must_use = "dropping the permit immediately gives back the call slot"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl CircuitPermit<'_> {
    /// Returns true when this success closed a previously open circuit
    pub fn succeed(mut self) -> bool {
        self.settled = true;
        self.breaker.record_success()
    }

    pub fn fail(mut self) -> FailureOutcome {
        self.settled = true;
        self.breaker.record_failure()
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            self.breaker.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));

        assert_eq!(breaker.record_failure(), FailureOutcome::StillClosed);
        assert_eq!(breaker.record_failure(), FailureOutcome::StillClosed);
        assert!(breaker.is_available());
        assert_eq!(breaker.record_failure(), FailureOutcome::Opened);

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.is_available());
        assert!(breaker.try_acquire().is_none());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));

        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.record_success());
        breaker.record_failure();
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_allows_single_probe() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        let probe = breaker.try_acquire();
        assert!(probe.is_some());
        assert!(breaker.try_acquire().is_none());
        assert!(!breaker.is_available());

        drop(probe);
        assert!(breaker.is_available());
        assert!(breaker.try_acquire().is_some());
    }

    #[test]
    fn test_closed_permit_drop_leaves_probe_alone() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        let stale = breaker.try_acquire();
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        let _probe = breaker.try_acquire();
        drop(stale);

        assert!(!breaker.is_available());
    }

    #[test]
    fn test_probe_outcome() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        let probe = breaker.try_acquire().unwrap();
        assert_eq!(probe.fail(), FailureOutcome::Reopened);
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(30));
        let probe = breaker.try_acquire().unwrap();
        assert!(probe.succeed());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
