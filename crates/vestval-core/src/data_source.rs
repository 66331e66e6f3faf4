//! Price source trait and request/response types.
//!
//! This module defines the adapter contract (`DataSource`) that every price
//! provider implements, along with the request types for each endpoint.
//!
//! # Endpoints
//!
//! | Endpoint | Request | Response | Description |
//! |----------|---------|----------|-------------|
//! | Quote | [`QuoteRequest`] | [`Quote`] | Latest traded price |
//! | Daily | [`DailySeriesRequest`] | [`DailySeries`] | Daily closes over a window |
//!
//! Adapters are handed to callers explicitly (see
//! [`SourceRouterBuilder`](crate::SourceRouterBuilder)); nothing in this
//! crate holds a process-wide client.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::window::DateWindow;
use crate::{DailySeries, ProviderId, Quote, Symbol};

/// Boxed future returned by adapter methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Data endpoint type used for routing and capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Quote,
    Daily,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Daily => "daily",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported endpoint matrix for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub quote: bool,
    pub daily: bool,
}

impl CapabilitySet {
    pub const fn new(quote: bool, daily: bool) -> Self {
        Self { quote, daily }
    }

    pub const fn full() -> Self {
        Self::new(true, true)
    }

    pub const fn supports(self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Quote => self.quote,
            Endpoint::Daily => self.daily,
        }
    }

    pub fn supported_endpoints(self) -> Vec<&'static str> {
        let mut values = Vec::with_capacity(2);
        if self.quote {
            values.push(Endpoint::Quote.as_str());
        }
        if self.daily {
            values.push(Endpoint::Daily.as_str());
        }
        values
    }
}

/// Health state used by source scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime source health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
    /// Provider score component used by `auto` routing.
    pub score: u16,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool, score: u16) -> Self {
        Self {
            state,
            rate_available,
            score,
        }
    }

    pub const fn healthy(score: u16) -> Self {
        Self::new(HealthState::Healthy, true, score)
    }

    pub const fn degraded(score: u16) -> Self {
        Self::new(HealthState::Degraded, true, score)
    }

    pub const fn unhealthy() -> Self {
        Self::new(HealthState::Unhealthy, false, 0)
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    UnsupportedEndpoint,
    Unavailable,
    RateLimited,
    InvalidRequest,
    AdapterNotRegistered,
    Internal,
}

/// Structured source error used by router fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unsupported_endpoint(endpoint: Endpoint) -> Self {
        Self {
            kind: SourceErrorKind::UnsupportedEndpoint,
            message: format!("endpoint '{endpoint}' is not supported by this source"),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn adapter_not_registered(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::AdapterNotRegistered,
            message: format!("source adapter '{provider}' is not registered"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::UnsupportedEndpoint => "source.unsupported_endpoint",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::AdapterNotRegistered => "source.adapter_not_registered",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for the current-quote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbol: Symbol,
}

impl QuoteRequest {
    pub fn new(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

/// Request payload for the daily-close endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySeriesRequest {
    pub symbol: Symbol,
    pub window: DateWindow,
}

impl DailySeriesRequest {
    pub fn new(symbol: Symbol, window: DateWindow) -> Self {
        Self { symbol, window }
    }
}

/// Source adapter contract.
///
/// All price providers implement this trait to be used with the router.
///
/// # Required Methods
///
/// | Method | Description |
/// |--------|-------------|
/// | [`id`](DataSource::id) | Unique provider identifier |
/// | [`capabilities`](DataSource::capabilities) | Supported endpoints |
/// | [`quote`](DataSource::quote) | Fetch the latest price |
/// | [`daily_closes`](DataSource::daily_closes) | Fetch daily closes for a window |
/// | [`health`](DataSource::health) | Check source health |
///
/// Implementations must be `Send + Sync` as they may be shared across tasks.
pub trait DataSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn capabilities(&self) -> CapabilitySet;

    /// Fetches the latest traded price for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the provider is unavailable, rate limited,
    /// or rejects the symbol.
    fn quote<'a>(&'a self, req: QuoteRequest) -> SourceFuture<'a, Quote>;

    /// Fetches daily closes covering `req.window`.
    ///
    /// The returned series may contain days outside the window and days
    /// without a close; callers filter.
    fn daily_closes<'a>(&'a self, req: DailySeriesRequest) -> SourceFuture<'a, DailySeries>;

    /// Returns the current health status of this source.
    ///
    /// Used by the router for source scoring and fallback decisions.
    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>>;
}
