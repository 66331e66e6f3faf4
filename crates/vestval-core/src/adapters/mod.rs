//! Price provider adapters.
//!
//! Both adapters share [`Upstream`], which wraps one provider's transport
//! with its circuit breaker and retry budget.

mod alphavantage;
mod yahoo;

pub use alphavantage::AlphaVantageAdapter;
pub use yahoo::YahooAdapter;

use std::sync::Arc;

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::data_source::{HealthState, HealthStatus, SourceError};
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::retry::RetryConfig;
use crate::throttling::Throttle;
use crate::{ProviderId, ValidationError};

/// One provider's guarded transport.
#[derive(Clone)]
pub(crate) struct Upstream {
    provider: ProviderId,
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    throttle: Throttle,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl Upstream {
    pub(crate) fn new(
        provider: ProviderId,
        http_client: Arc<dyn HttpClient>,
        circuit: CircuitBreakerConfig,
        throttle: Throttle,
    ) -> Self {
        Self {
            provider,
            http_client,
            circuit_breaker: Arc::new(CircuitBreaker::new(provider, circuit)),
            throttle,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Fetches `request`, retrying transient failures, and returns the body.
    ///
    /// Each attempt must pass the circuit breaker and the provider quota.
    /// A quota refusal is returned as `rate_limited` without retrying so the
    /// router can move on to another provider.
    pub(crate) async fn fetch(&self, request: HttpRequest) -> Result<String, SourceError> {
        let request = request.with_timeout_ms(self.timeout_ms);
        let mut attempt = 0_u32;

        loop {
            self.circuit_breaker.admit()?;
            if let Err(wait) = self.throttle.acquire() {
                return Err(SourceError::rate_limited(format!(
                    "{} request budget exhausted; retry in {:.1}s",
                    self.provider,
                    wait.as_secs_f64()
                )));
            }

            tracing::debug!(provider = %self.provider, url = %request.url, attempt, "upstream request");
            let (error, retryable) = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    self.circuit_breaker.record_success();
                    return Ok(response.body);
                }
                Ok(response) => {
                    let retryable = self.retry.should_retry_status(response.status);
                    let message = format!("{} returned status {}", self.provider, response.status);
                    let error = if response.status == 429 {
                        SourceError::rate_limited(message)
                    } else if retryable || response.status >= 500 {
                        SourceError::unavailable(message)
                    } else {
                        SourceError::invalid_request(message)
                    };
                    if retryable || response.status >= 500 {
                        self.circuit_breaker.record_failure();
                    }
                    (error, retryable)
                }
                Err(transport) => {
                    self.circuit_breaker.record_failure();
                    let retryable = self.retry.should_retry_error(&transport);
                    let message = format!("{} transport error: {}", self.provider, transport.message());
                    let error = if retryable {
                        SourceError::unavailable(message)
                    } else {
                        SourceError::internal(message)
                    };
                    (error, retryable)
                }
            };

            if !retryable || !self.retry.has_budget(attempt) {
                return Err(error);
            }

            let delay = self.retry.delay_for_attempt(attempt);
            tracing::warn!(
                provider = %self.provider,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                %error,
                "retrying upstream call"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Health derived from circuit state and remaining quota.
    pub(crate) fn health(&self, score: u16) -> HealthStatus {
        let rate_available = self.throttle.has_budget();
        match self.circuit_breaker.state() {
            CircuitState::Closed if rate_available => HealthStatus::healthy(score),
            CircuitState::Closed | CircuitState::HalfOpen => {
                HealthStatus::new(HealthState::Degraded, rate_available, score)
            }
            CircuitState::Open => HealthStatus::new(HealthState::Unhealthy, false, score),
        }
    }

    pub(crate) fn set_retry(&mut self, retry: RetryConfig) {
        self.retry = retry;
    }

    pub(crate) fn set_timeout_ms(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }

    pub(crate) fn set_circuit(&mut self, circuit: CircuitBreakerConfig) {
        self.circuit_breaker = Arc::new(CircuitBreaker::new(self.provider, circuit));
    }
}

fn validation_to_error(error: ValidationError) -> SourceError {
    SourceError::internal(error.to_string())
}
