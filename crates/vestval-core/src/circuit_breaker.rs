use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::data_source::SourceError;
use crate::ProviderId;

/// Runtime circuit state for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed calls that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is let through.
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Thread-safe circuit breaker guarding one provider's upstream calls.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            config,
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admits a call, or fails fast while the circuit is open.
    ///
    /// After `open_timeout` one probe is admitted in the half-open state.
    pub fn admit(&self) -> Result<(), SourceError> {
        let mut inner = self.lock();
        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let cooled_down = inner
            .opened_at
            .is_some_and(|opened_at| opened_at.elapsed() >= self.config.open_timeout);
        if cooled_down {
            tracing::debug!(provider = %self.provider, "circuit half-open, probing");
            inner.state = CircuitState::HalfOpen;
            inner.opened_at = None;
            return Ok(());
        }

        Err(SourceError::unavailable(format!(
            "{} circuit is open after {} consecutive failures",
            self.provider, inner.consecutive_failures
        )))
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trips = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if trips && inner.state != CircuitState::Open {
            tracing::warn!(
                provider = %self.provider,
                failures = inner.consecutive_failures,
                "circuit opened"
            );
        }
        if trips {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceErrorKind;

    fn breaker(failure_threshold: u32, open_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            ProviderId::Yahoo,
            CircuitBreakerConfig {
                failure_threshold,
                open_timeout,
            },
        )
    }

    #[test]
    fn opens_after_threshold_and_fails_fast() {
        let breaker = breaker(2, Duration::from_secs(60));

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.admit().is_ok());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        let error = breaker.admit().expect_err("open circuit rejects");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }

    #[test]
    fn half_open_probe_closes_on_success() {
        let breaker = breaker(1, Duration::from_millis(1));

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(5));
        assert!(breaker.admit().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn failed_probe_reopens_immediately() {
        let breaker = breaker(3, Duration::from_millis(1));
        for _ in 0..3 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(5));
        assert!(breaker.admit().is_ok());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
