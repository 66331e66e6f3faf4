use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::adapters::{AlphaVantageAdapter, YahooAdapter};
use crate::config::Settings;
use crate::data_source::{
    CapabilitySet, DailySeriesRequest, DataSource, Endpoint, HealthState, HealthStatus,
    QuoteRequest, SourceError, SourceFuture,
};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::{DailySeries, EnvelopeError, ProviderId, Quote};

/// Source selection strategy for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceStrategy {
    /// Health-scored order with fallback.
    #[default]
    Auto,
    /// Exactly one provider, no fallback.
    Strict(ProviderId),
}

impl SourceStrategy {
    fn is_strict(self) -> bool {
        matches!(self, Self::Strict(_))
    }
}

/// Successful routed call.
#[derive(Debug, Clone)]
pub struct RouteSuccess<T> {
    pub data: T,
    pub selected_source: ProviderId,
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    /// Failures from providers tried before the one that answered.
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

/// Failed routed call after exhausting candidates.
#[derive(Debug, Clone)]
pub struct RouteFailure {
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    /// The final provider error, for callers that surface a single cause.
    pub last_error: SourceError,
    pub latency_ms: u64,
}

pub type RouteResult<T> = Result<RouteSuccess<T>, RouteFailure>;

/// Which providers were consulted to produce a value, and how each one that
/// did not answer failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTrace {
    pub source_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
}

impl RouteTrace {
    pub(crate) fn merge(&mut self, other: &RouteTrace) {
        self.source_chain.extend_from_slice(&other.source_chain);
        self.warnings.extend(other.warnings.iter().cloned());
        self.errors.extend(other.errors.iter().cloned());
        self.latency_ms = self.latency_ms.max(other.latency_ms);
    }
}

impl<T> RouteSuccess<T> {
    pub fn into_parts(self) -> (T, ProviderId, RouteTrace) {
        let trace = RouteTrace {
            source_chain: self.source_chain,
            warnings: self.warnings,
            errors: self.errors,
            latency_ms: self.latency_ms,
        };
        (self.data, self.selected_source, trace)
    }
}

impl RouteFailure {
    pub fn into_parts(self) -> (SourceError, RouteTrace) {
        let trace = RouteTrace {
            source_chain: self.source_chain,
            warnings: self.warnings,
            errors: self.errors,
            latency_ms: self.latency_ms,
        };
        (self.last_error, trace)
    }
}

/// Per-provider view used by the `sources` listing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceSnapshot {
    pub id: ProviderId,
    pub capabilities: CapabilitySet,
    pub health: HealthStatus,
}

impl SourceSnapshot {
    pub fn status_label(self) -> &'static str {
        if !self.health.rate_available {
            return "rate_limited";
        }

        match self.health.state {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Adapter registry and routing engine.
pub struct SourceRouter {
    adapters: HashMap<ProviderId, Arc<dyn DataSource>>,
}

impl SourceRouter {
    pub fn new(adapters: Vec<Arc<dyn DataSource>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { adapters }
    }

    pub fn registered(&self) -> Vec<ProviderId> {
        let mut providers = self.adapters.keys().copied().collect::<Vec<_>>();
        providers.sort_by_key(|provider| provider.as_str());
        providers
    }

    pub async fn snapshot(&self, provider: ProviderId) -> Option<SourceSnapshot> {
        let adapter = self.adapters.get(&provider)?;
        Some(SourceSnapshot {
            id: provider,
            capabilities: adapter.capabilities(),
            health: adapter.health().await,
        })
    }

    pub async fn route_quote(
        &self,
        req: &QuoteRequest,
        strategy: SourceStrategy,
    ) -> RouteResult<Quote> {
        self.route_endpoint(Endpoint::Quote, strategy, |source| source.quote(req.clone()))
            .await
    }

    pub async fn route_daily(
        &self,
        req: &DailySeriesRequest,
        strategy: SourceStrategy,
    ) -> RouteResult<DailySeries> {
        self.route_endpoint(Endpoint::Daily, strategy, |source| {
            source.daily_closes(req.clone())
        })
        .await
    }

    async fn route_endpoint<'s, T, F>(
        &'s self,
        endpoint: Endpoint,
        strategy: SourceStrategy,
        mut invoke: F,
    ) -> RouteResult<T>
    where
        F: FnMut(&'s dyn DataSource) -> SourceFuture<'s, T>,
    {
        let started = Instant::now();
        let planned_chain = self.plan_sources(endpoint, strategy).await;
        let mut source_chain = Vec::with_capacity(planned_chain.len());
        let mut errors = Vec::new();
        let mut last_error = None;

        for provider in planned_chain {
            source_chain.push(provider);
            match self.try_source(provider, endpoint, &mut invoke).await {
                Ok(data) => {
                    let mut warnings = Vec::new();
                    if !errors.is_empty() {
                        tracing::warn!(
                            %provider,
                            %endpoint,
                            failed = errors.len(),
                            "fallback source answered"
                        );
                        warnings.push(format!(
                            "source fallback succeeded with '{provider}' after {} failed attempt(s)",
                            errors.len()
                        ));
                    }

                    return Ok(RouteSuccess {
                        data,
                        selected_source: provider,
                        source_chain,
                        warnings,
                        errors,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    tracing::debug!(%provider, %endpoint, %error, "source failed");
                    errors.push(EnvelopeError::from_source(provider, &error));
                    last_error = Some(error);
                    if strategy.is_strict() {
                        break;
                    }
                }
            }
        }

        let last_error = match last_error {
            Some(error) => error,
            None => {
                let message = format!("no source candidates available for endpoint '{endpoint}'");
                errors.push(EnvelopeError {
                    code: String::from("source.no_candidate"),
                    message: message.clone(),
                    retryable: Some(false),
                    source: None,
                });
                SourceError::unavailable(message)
            }
        };

        Err(RouteFailure {
            source_chain,
            warnings: vec![format!("all sources failed for endpoint '{endpoint}'")],
            errors,
            last_error,
            latency_ms: elapsed_ms(started),
        })
    }

    async fn try_source<'s, T, F>(
        &'s self,
        provider: ProviderId,
        endpoint: Endpoint,
        invoke: &mut F,
    ) -> Result<T, SourceError>
    where
        F: FnMut(&'s dyn DataSource) -> SourceFuture<'s, T>,
    {
        let adapter = self
            .adapters
            .get(&provider)
            .ok_or_else(|| SourceError::adapter_not_registered(provider))?;

        if !adapter.capabilities().supports(endpoint) {
            return Err(SourceError::unsupported_endpoint(endpoint));
        }

        let health = adapter.health().await;
        if health.state == HealthState::Unhealthy {
            return Err(SourceError::unavailable(
                "source health check reported unhealthy",
            ));
        }
        if !health.rate_available {
            return Err(SourceError::rate_limited(
                "source has no rate budget available",
            ));
        }

        invoke(adapter.as_ref()).await
    }

    async fn plan_sources(&self, endpoint: Endpoint, strategy: SourceStrategy) -> Vec<ProviderId> {
        match strategy {
            SourceStrategy::Auto => self.auto_chain(endpoint).await,
            SourceStrategy::Strict(provider) => vec![provider],
        }
    }

    async fn auto_chain(&self, endpoint: Endpoint) -> Vec<ProviderId> {
        let mut scored = Vec::with_capacity(self.adapters.len());
        for (provider, source) in &self.adapters {
            if !source.capabilities().supports(endpoint) {
                continue;
            }
            let health = source.health().await;
            let health_score = match health.state {
                HealthState::Healthy => 250,
                HealthState::Degraded => 100,
                HealthState::Unhealthy => 0,
            };
            let rate_score = if health.rate_available { 150 } else { 0 };

            scored.push((*provider, health_score + rate_score + i32::from(health.score)));
        }

        scored.sort_by(|left, right| {
            right
                .1
                .cmp(&left.1)
                .then_with(|| left.0.as_str().cmp(right.0.as_str()))
        });

        scored.into_iter().map(|(provider, _)| provider).collect()
    }
}

/// Wires adapters from [`Settings`] onto one shared transport.
///
/// Yahoo needs no key and is always registered. Alpha Vantage is registered
/// only when an API key is configured.
pub struct SourceRouterBuilder {
    settings: Settings,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl SourceRouterBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            http_client: None,
        }
    }

    /// Overrides the reqwest transport, e.g. with a scripted client in tests.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> SourceRouter {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let retry = RetryConfig::exponential(self.settings.max_retries);

        let mut adapters: Vec<Arc<dyn DataSource>> = vec![Arc::new(
            YahooAdapter::new(http_client.clone())
                .with_retry(retry.clone())
                .with_timeout_ms(self.settings.timeout_ms),
        )];

        match self.settings.alphavantage_api_key {
            Some(api_key) => adapters.push(Arc::new(
                AlphaVantageAdapter::new(http_client, api_key)
                    .with_retry(retry)
                    .with_timeout_ms(self.settings.timeout_ms),
            )),
            None => tracing::debug!("no Alpha Vantage API key configured; adapter disabled"),
        }

        SourceRouter::new(adapters)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
